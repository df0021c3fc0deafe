use crate::consts::DEFAULT_FUNCTION_TIMEOUT;
use k8s_openapi::api::core::v1::EnvVar;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(CustomResource, Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "runtime.operato.rs",
    version = "v1alpha1",
    kind = "Function",
    plural = "functions",
    derive = "PartialEq",
    namespaced,
    printcolumn = r#"{"name": "runtime", "type": "string", "jsonPath": ".spec.runtime"}"#,
    printcolumn = r#"{"name": "size", "type": "string", "jsonPath": ".spec.size"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    /// function defines the content of a function
    pub function: String,

    /// functionContentType defines file content type (plaintext or base64)
    #[serde(default)]
    pub function_content_type: FunctionContentType,

    /// size defines the size of a function pertaining to memory and cpu only.
    /// Values can be any one of these S, M, L, XL
    #[serde(default)]
    pub size: FunctionSize,

    /// runtime is the programming language used for a function e.g. nodejs8
    pub runtime: String,

    /// timeout defines maximum duration alloted to a function to complete its execution,
    /// defaults to 180s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i32>,

    /// deps defines the dependencies for a function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<String>,

    /// env defines an array of key value pairs to be used as env variables for a function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FunctionContentType {
    #[default]
    Plaintext,
    Base64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default, JsonSchema)]
pub enum FunctionSize {
    #[default]
    S,
    M,
    L,
    XL,
}

impl FunctionSpec {
    pub fn timeout_seconds(&self) -> i32 {
        self.timeout.unwrap_or(DEFAULT_FUNCTION_TIMEOUT)
    }
}

/// Difference between a desired and an observed derived ConfigMap
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ConfigMapDiff {
    /// The observed ConfigMap has no data at all
    NoData,
    /// An entry is missing or different
    Entry(String),
    /// An entry is present but not managed by the operator
    Unexpected(String),
    /// The function's controller owner reference is missing
    OwnerReference,
}

/// Difference between a desired and an observed serving Service
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ServiceDiff {
    /// ```RunLatest``` configuration is missing
    NoRunLatest,
    /// ```Build``` is missing
    NoBuild,
    /// ```ServiceAccountName``` of the build is missing or different
    ServiceAccount,
    /// Number of build steps is different
    StepCount,
    /// A build step's image, args or mounts are different. Name: the step's name
    Step(String),
    /// Build volumes are missing or different
    Volumes,
    /// ```Image``` of the revision container is different
    Image,
    /// ```Env``` of the revision container is missing or different
    Env,
    /// The Service was built from another version of the function's ConfigMap
    SourceVersion,
    /// The function's controller owner reference is missing
    OwnerReference,
}

#[derive(ThisError, Debug)]
pub enum IntoConfigMapError {
    #[error("Failed to get owner reference")]
    FailedToGetOwnerReference,
}

#[derive(ThisError, Debug)]
pub enum IntoServiceError {
    #[error("Failed to get owner reference")]
    FailedToGetOwnerReference,
}
