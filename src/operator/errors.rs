use crate::crds::defs::{IntoConfigMapError, IntoServiceError};
use crate::runtime_info::RuntimeInfoError;
use crate::store::StoreError;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ReconcileError {
    #[error("Resource has no namespace.")]
    Namespace,
    #[error("ConfigMap \"{name}\" not found")]
    ConfigNotFound { name: String, namespace: String },
    #[error("Failed to read ConfigMap \"{name}\": {error}")]
    ConfigRead {
        name: String,
        #[source]
        error: StoreError,
    },
    #[error("Error in reading ConfigMap: {0}")]
    ConfigParse(#[source] RuntimeInfoError),
    #[error("Failed to get function: {0}")]
    FunctionRead(#[source] StoreError),
    #[error("Function \"{namespace}/{name}\" has the name of the operator ConfigMap.")]
    ReservedName { namespace: String, name: String },
    #[error("Runtime \"{runtime}\" is not configured.")]
    UnknownRuntime { runtime: String },
    #[error("ConfigMap error: {0}")]
    ConfigMap(#[source] ConfigMapError),
    #[error("Service error: {0}")]
    Service(#[source] ServiceError),
}

impl ReconcileError {
    /// Errors that will not go away before someone edits a resource
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ReconcileError::Namespace
                | ReconcileError::ConfigParse(_)
                | ReconcileError::ReservedName { .. }
                | ReconcileError::UnknownRuntime { .. }
                | ReconcileError::ConfigMap(ConfigMapError::Generate(_))
                | ReconcileError::Service(ServiceError::Generate(_))
        )
    }
}

#[derive(ThisError, Debug)]
pub enum ConfigMapError {
    #[error("Failed to generate ConfigMap: {0}")]
    Generate(#[source] IntoConfigMapError),
    #[error("Failed to get ConfigMap: {0}")]
    Get(#[source] StoreError),
    #[error("Failed to create ConfigMap: {0}")]
    Create(#[source] StoreError),
    #[error("Failed to update ConfigMap: {0}")]
    Update(#[source] StoreError),
}

#[derive(ThisError, Debug)]
pub enum ServiceError {
    #[error("Failed to generate service: {0}")]
    Generate(#[source] IntoServiceError),
    #[error("Failed to get service: {0}")]
    Get(#[source] StoreError),
    #[error("Failed to create service: {0}")]
    Create(#[source] StoreError),
    #[error("Failed to update service: {0}")]
    Update(#[source] StoreError),
}
