use crate::consts::{DOCKER_REGISTRY_KEY, RUNTIMES_KEY, SERVICE_ACCOUNT_NAME_KEY};
use crate::utils::is_blank;
use k8s_openapi::api::core::v1::ConfigMap;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum RuntimeInfoError {
    #[error("Failed to parse runtimes: {0}")]
    Parse(#[source] serde_yaml::Error),
}

/// A runtime entry of the operator ConfigMap
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct RuntimeSupported {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DockerFileName")]
    pub docker_file_name: String,
}

/// Operator wide build settings, read from the operator ConfigMap on every pass.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct RuntimeInfo {
    /// Service account the build runs with
    pub service_account: String,
    /// Registry prefix of built images
    /// e.g. docker.io/functions
    pub registry_info: String,
    pub available_runtimes: Vec<RuntimeSupported>,
}

impl RuntimeInfo {
    /// Name of the ConfigMap holding the Dockerfile of `runtime`.
    /// The first entry wins if a runtime is listed more than once.
    pub fn docker_file_config_map_name(&self, runtime: &str) -> Option<&str> {
        self.available_runtimes
            .iter()
            .find(|supported| supported.id == runtime)
            .map(|supported| supported.docker_file_name.as_str())
    }
}

impl TryFrom<&ConfigMap> for RuntimeInfo {
    type Error = RuntimeInfoError;

    fn try_from(config_map: &ConfigMap) -> Result<Self, Self::Error> {
        let data = config_map.data.clone().unwrap_or_default();

        // YAML flow sequences accept the trailing commas hand written configs tend to have
        let available_runtimes = match data.get(RUNTIMES_KEY) {
            Some(runtimes) if !is_blank(runtimes) => {
                serde_yaml::from_str::<Vec<RuntimeSupported>>(runtimes)
                    .map_err(RuntimeInfoError::Parse)?
            }
            _ => Vec::new(),
        };

        Ok(RuntimeInfo {
            service_account: data
                .get(SERVICE_ACCOUNT_NAME_KEY)
                .cloned()
                .unwrap_or_default(),
            registry_info: data.get(DOCKER_REGISTRY_KEY).cloned().unwrap_or_default(),
            available_runtimes,
        })
    }
}
