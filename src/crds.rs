pub mod defs;
pub mod impls;
pub mod knative;

pub use defs::{Function, FunctionSpec};
pub use knative::KnativeService;

use kube::CustomResourceExt;

impl Function {
    pub fn generate_crd_yaml() -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&Function::crd())
    }

    pub fn generate_crd_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Function::crd())
    }
}
