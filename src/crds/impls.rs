use super::defs::{
    ConfigMapDiff, Function, FunctionSpec, IntoConfigMapError, IntoServiceError, ServiceDiff,
};
use super::knative::{
    BuildSpec, ConfigurationSpec, KnativeService, RevisionSpec, RevisionTemplateSpec,
    RunLatestType, ServiceSpec,
};
use crate::consts::{
    BUILDER_IMAGE, BUILD_STEP_NAME, DEFAULT_DEPS, DEPS_KEY, DESTINATION_ARG_PREFIX,
    DOCKERFILE_ARG, DOCKERFILE_VOLUME_MOUNT_PATH, DOCKERFILE_VOLUME_NAME, FUNCTION_VOLUME_MOUNT_PATH,
    FUNCTION_VOLUME_NAME, HANDLER_KEY, HANDLER_VALUE,
    SOURCE_VERSION_ANNOTATION, SOURCE_KEY, VOLUME_DEFAULT_MODE,
};
use crate::utils::{collect_missing_keys, collect_missing_or_different_keys, is_blank};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, EnvVar, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::core::{ObjectMeta, Resource, ResourceExt};
use std::collections::BTreeMap;

impl FunctionSpec {
    fn to_deps(&self) -> String {
        match self.deps {
            Some(ref deps) if !is_blank(deps) => deps.clone(),
            _ => String::from(DEFAULT_DEPS),
        }
    }

    pub fn to_config_map_data(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (String::from(HANDLER_KEY), String::from(HANDLER_VALUE)),
            (String::from(SOURCE_KEY), self.function.clone()),
            (String::from(DEPS_KEY), self.to_deps()),
        ])
    }
}

impl Function {
    /// Metadata shared by all objects derived from a function
    fn to_derived_meta(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.name_any()),
            namespace: self.namespace(),
            labels: self.metadata.labels.clone(),
            ..Default::default()
        }
    }
}

/// Generate a fresh ConfigMap with refs
impl TryFrom<&Function> for ConfigMap {
    type Error = IntoConfigMapError;

    fn try_from(value: &Function) -> Result<Self, Self::Error> {
        let oref = value
            .controller_owner_ref(&())
            .ok_or(IntoConfigMapError::FailedToGetOwnerReference)?;

        let mut metadata = value.to_derived_meta();
        metadata.owner_references = Some(vec![oref]);

        Ok(ConfigMap {
            metadata,
            data: Some(value.spec.to_config_map_data()),
            ..Default::default()
        })
    }
}

/// Desired state of the serving Service of a function
pub struct ServiceBuilder<'a> {
    image: String,
    function: &'a Function,
    service_account: &'a str,
    dockerfile_config_map: &'a str,
    source_version: Option<String>,
}

impl<'a> ServiceBuilder<'a> {
    pub fn new(
        image: String,
        function: &'a Function,
        service_account: &'a str,
        dockerfile_config_map: &'a str,
    ) -> Self {
        Self {
            image,
            function,
            service_account,
            dockerfile_config_map,
            source_version: None,
        }
    }

    /// Records the resource version of the ConfigMap the image is built from
    pub fn with_source_version(mut self, source_version: Option<String>) -> Self {
        self.source_version = source_version;
        self
    }

    fn to_service_account(&self) -> Option<String> {
        Some(self.service_account.to_string())
    }

    fn to_config_map_volume(name: &str, config_map: &str) -> Volume {
        Volume {
            name: name.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                default_mode: Some(VOLUME_DEFAULT_MODE),
                name: Some(config_map.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn to_volumes(&self) -> Vec<Volume> {
        vec![
            Self::to_config_map_volume(DOCKERFILE_VOLUME_NAME, self.dockerfile_config_map),
            Self::to_config_map_volume(FUNCTION_VOLUME_NAME, &self.function.name_any()),
        ]
    }

    fn to_volume_mounts(&self) -> Vec<VolumeMount> {
        vec![
            VolumeMount {
                name: String::from(DOCKERFILE_VOLUME_NAME),
                mount_path: String::from(DOCKERFILE_VOLUME_MOUNT_PATH),
                ..Default::default()
            },
            VolumeMount {
                name: String::from(FUNCTION_VOLUME_NAME),
                mount_path: String::from(FUNCTION_VOLUME_MOUNT_PATH),
                ..Default::default()
            },
        ]
    }

    fn to_build_args(&self) -> Vec<String> {
        vec![
            String::from(DOCKERFILE_ARG),
            format!("{DESTINATION_ARG_PREFIX}{}", self.image),
        ]
    }

    fn to_build_step(&self) -> Container {
        Container {
            name: String::from(BUILD_STEP_NAME),
            image: Some(String::from(BUILDER_IMAGE)),
            args: Some(self.to_build_args()),
            volume_mounts: Some(self.to_volume_mounts()),
            ..Default::default()
        }
    }

    // TODO: derive timeout (FunctionSpec::timeout_seconds), runtime and memory limit
    // from the function's spec once the runtime images read them
    fn to_revision_env(&self) -> Vec<EnvVar> {
        [
            ("FUNC_HANDLER", "main"),
            ("MOD_NAME", "handler"),
            ("FUNC_TIMEOUT", "180"),
            ("FUNC_RUNTIME", "nodejs8"),
            ("FUNC_MEMORY_LIMIT", "128Mi"),
            ("FUNC_PORT", "8080"),
            ("NODE_PATH", "$(KUBELESS_INSTALL_VOLUME)/node_modules"),
        ]
        .into_iter()
        .map(|(name, value)| EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            ..Default::default()
        })
        .collect()
    }

    fn to_run_container(&self) -> Container {
        // Unnamed, serving names the user container itself
        Container {
            image: Some(self.image.clone()),
            env: Some(self.to_revision_env()),
            ..Default::default()
        }
    }

    fn to_annotations(&self) -> Option<BTreeMap<String, String>> {
        self.source_version.clone().map(|source_version| {
            BTreeMap::from([(String::from(SOURCE_VERSION_ANNOTATION), source_version)])
        })
    }
}

impl From<&ServiceBuilder<'_>> for BuildSpec {
    fn from(value: &ServiceBuilder<'_>) -> Self {
        BuildSpec {
            service_account_name: value.to_service_account(),
            steps: vec![value.to_build_step()],
            volumes: value.to_volumes(),
        }
    }
}

impl From<&ServiceBuilder<'_>> for RevisionTemplateSpec {
    fn from(value: &ServiceBuilder<'_>) -> Self {
        RevisionTemplateSpec {
            spec: RevisionSpec {
                container: value.to_run_container(),
            },
        }
    }
}

impl From<&ServiceBuilder<'_>> for ConfigurationSpec {
    fn from(value: &ServiceBuilder<'_>) -> Self {
        ConfigurationSpec {
            build: Some(BuildSpec::from(value)),
            revision_template: RevisionTemplateSpec::from(value),
        }
    }
}

/// Generate a fresh service spec
impl From<&ServiceBuilder<'_>> for ServiceSpec {
    fn from(value: &ServiceBuilder<'_>) -> Self {
        ServiceSpec {
            run_latest: Some(RunLatestType {
                configuration: ConfigurationSpec::from(value),
            }),
        }
    }
}

/// Generate a fresh service with refs
impl TryFrom<&ServiceBuilder<'_>> for KnativeService {
    type Error = IntoServiceError;

    fn try_from(value: &ServiceBuilder<'_>) -> Result<Self, Self::Error> {
        let oref = value
            .function
            .controller_owner_ref(&())
            .ok_or(IntoServiceError::FailedToGetOwnerReference)?;

        let mut metadata = value.function.to_derived_meta();
        metadata.owner_references = Some(vec![oref]);
        metadata.annotations = value.to_annotations();

        Ok(KnativeService {
            metadata,
            spec: ServiceSpec::from(value),
        })
    }
}

/// Compares the data of the desired ConfigMap to an observed one
pub fn config_map_diffs(desired: &ConfigMap, observed: &ConfigMap) -> Vec<ConfigMapDiff> {
    let mut diffs = Vec::new();

    if !owner_references_match(desired.owner_references(), observed.owner_references()) {
        diffs.push(ConfigMapDiff::OwnerReference);
    }

    let empty = BTreeMap::new();
    let desired_data = desired.data.as_ref().unwrap_or(&empty);

    let Some(ref observed_data) = observed.data else {
        if !desired_data.is_empty() {
            diffs.push(ConfigMapDiff::NoData);
        }
        return diffs;
    };

    diffs.extend(
        collect_missing_or_different_keys(desired_data, observed_data)
            .into_iter()
            .map(|key| ConfigMapDiff::Entry(key.to_string())),
    );

    diffs.extend(
        collect_missing_keys(observed_data, desired_data)
            .into_iter()
            .map(|key| ConfigMapDiff::Unexpected(key.to_string())),
    );

    diffs
}

/// Owner references are matched by uid, other fields may be defaulted by the API server
fn owner_references_match(desired: &[OwnerReference], observed: &[OwnerReference]) -> bool {
    desired
        .iter()
        .all(|d| observed.iter().any(|o| o.uid == d.uid))
}

/// Adds the owner references of `desired` that `observed` is missing.
/// A controller reference of `desired` replaces any other controller reference,
/// e.g. one left behind by a deleted function of the same name.
pub fn merge_owner_references(observed: &mut ObjectMeta, desired: &ObjectMeta) {
    let missing: Vec<OwnerReference> = desired
        .owner_references
        .iter()
        .flatten()
        .filter(|d| {
            !observed
                .owner_references
                .iter()
                .flatten()
                .any(|o| o.uid == d.uid)
        })
        .cloned()
        .collect();

    if missing.is_empty() {
        return;
    }

    let replaces_controller = missing.iter().any(is_controller);
    let orefs = observed.owner_references.get_or_insert_with(Vec::new);

    if replaces_controller {
        orefs.retain(|oref| !is_controller(oref));
    }

    orefs.extend(missing);
}

fn is_controller(oref: &OwnerReference) -> bool {
    oref.controller.unwrap_or(false)
}

fn mounts_match(desired: &[VolumeMount], observed: &[VolumeMount]) -> bool {
    desired.len() == observed.len()
        && desired
            .iter()
            .zip(observed)
            .all(|(d, o)| d.name == o.name && d.mount_path == o.mount_path)
}

fn steps_match(desired: &Container, observed: &Container) -> bool {
    desired.name == observed.name
        && desired.image == observed.image
        && desired.args.as_deref().unwrap_or_default() == observed.args.as_deref().unwrap_or_default()
        && mounts_match(
            desired.volume_mounts.as_deref().unwrap_or_default(),
            observed.volume_mounts.as_deref().unwrap_or_default(),
        )
}

fn config_map_volume_key(volume: &Volume) -> (&str, Option<&str>, Option<i32>) {
    let config_map = volume.config_map.as_ref();
    (
        volume.name.as_str(),
        config_map.and_then(|source| source.name.as_deref()),
        config_map.and_then(|source| source.default_mode),
    )
}

fn volumes_match(desired: &[Volume], observed: &[Volume]) -> bool {
    desired.len() == observed.len()
        && desired
            .iter()
            .zip(observed)
            .all(|(d, o)| config_map_volume_key(d) == config_map_volume_key(o))
}

fn env_key(env: &EnvVar) -> (&str, Option<&str>) {
    (env.name.as_str(), env.value.as_deref())
}

fn env_matches(desired: &[EnvVar], observed: &[EnvVar]) -> bool {
    desired.len() == observed.len()
        && desired
            .iter()
            .zip(observed)
            .all(|(d, o)| env_key(d) == env_key(o))
}

/// Compares the fields the operator manages on a serving Service.
/// Fields defaulted by the API server or other controllers are not compared.
pub fn service_diffs(desired: &KnativeService, observed: &KnativeService) -> Vec<ServiceDiff> {
    let mut diffs = Vec::new();

    if !owner_references_match(desired.owner_references(), observed.owner_references()) {
        diffs.push(ServiceDiff::OwnerReference);
    }

    let desired_source_version = desired.annotations().get(SOURCE_VERSION_ANNOTATION);
    if desired_source_version.is_some()
        && desired_source_version != observed.annotations().get(SOURCE_VERSION_ANNOTATION)
    {
        diffs.push(ServiceDiff::SourceVersion);
    }

    let (Some(desired_configuration), Some(observed_configuration)) =
        (desired.spec.configuration(), observed.spec.configuration())
    else {
        diffs.push(ServiceDiff::NoRunLatest);
        return diffs;
    };

    match (&desired_configuration.build, &observed_configuration.build) {
        (Some(desired_build), Some(observed_build)) => {
            if desired_build.service_account_name != observed_build.service_account_name {
                diffs.push(ServiceDiff::ServiceAccount);
            }

            if desired_build.steps.len() != observed_build.steps.len() {
                diffs.push(ServiceDiff::StepCount);
            } else {
                diffs.extend(
                    desired_build
                        .steps
                        .iter()
                        .zip(&observed_build.steps)
                        .filter(|(d, o)| !steps_match(d, o))
                        .map(|(d, _)| ServiceDiff::Step(d.name.clone())),
                );
            }

            if !volumes_match(&desired_build.volumes, &observed_build.volumes) {
                diffs.push(ServiceDiff::Volumes);
            }
        }
        (Some(_), None) => diffs.push(ServiceDiff::NoBuild),
        _ => {}
    }

    let desired_container = &desired_configuration.revision_template.spec.container;
    let observed_container = &observed_configuration.revision_template.spec.container;

    if desired_container.image != observed_container.image {
        diffs.push(ServiceDiff::Image);
    }

    if !env_matches(
        desired_container.env.as_deref().unwrap_or_default(),
        observed_container.env.as_deref().unwrap_or_default(),
    ) {
        diffs.push(ServiceDiff::Env);
    }

    diffs
}
