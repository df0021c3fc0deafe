//! Client side types for `serving.knative.dev/v1alpha1` Services.
//!
//! Only the parts the operator writes are modelled. Unknown fields of
//! observed objects (status, server side defaults) are ignored on read.

use k8s_openapi::api::core::v1::{Container, Volume};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[kube(
    group = "serving.knative.dev",
    version = "v1alpha1",
    kind = "Service",
    root = "KnativeService",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// runLatest rolls out the latest revision of the configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_latest: Option<RunLatestType>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunLatestType {
    pub configuration: ConfigurationSpec,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSpec {
    /// build produces the image the revision template runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSpec>,

    pub revision_template: RevisionTemplateSpec,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    #[serde(default)]
    pub steps: Vec<Container>,

    #[serde(default)]
    pub volumes: Vec<Volume>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevisionTemplateSpec {
    pub spec: RevisionSpec,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSpec {
    pub container: Container,
}

impl ServiceSpec {
    pub fn configuration(&self) -> Option<&ConfigurationSpec> {
        self.run_latest.as_ref().map(|run_latest| &run_latest.configuration)
    }

    pub fn build(&self) -> Option<&BuildSpec> {
        self.configuration()
            .and_then(|configuration| configuration.build.as_ref())
    }

    pub fn run_container(&self) -> Option<&Container> {
        self.configuration()
            .map(|configuration| &configuration.revision_template.spec.container)
    }

    pub fn run_image(&self) -> Option<&str> {
        self.run_container()
            .and_then(|container| container.image.as_deref())
    }
}
