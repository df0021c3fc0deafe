mod errors;

pub use errors::*;

use crate::consts::{CONFIG_MAP_DEFAULT_NAME, CONFIG_MAP_DEFAULT_NAMESPACE};
use crate::crds::impls::{config_map_diffs, merge_owner_references, service_diffs, ServiceBuilder};
use crate::crds::{Function, KnativeService};
use crate::image::ImageReference;
use crate::runtime_info::RuntimeInfo;
use crate::store::{KubeStore, Store};
use futures::stream::StreamExt;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{
    runtime::Controller,
    runtime::{controller::Action, watcher::Config},
    Api, Client as KubeClient, ResourceExt,
};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{trace_span, Instrument};

/// Location of the operator ConfigMap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub name: String,
    pub namespace: String,
}

impl Default for ConfigLocation {
    fn default() -> Self {
        Self {
            name: String::from(CONFIG_MAP_DEFAULT_NAME),
            namespace: String::from(CONFIG_MAP_DEFAULT_NAMESPACE),
        }
    }
}

/// Key of the function a pass converges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRequest {
    pub namespace: String,
    pub name: String,
}

impl TryFrom<&Function> for FunctionRequest {
    type Error = ReconcileError;

    fn try_from(function: &Function) -> Result<Self, Self::Error> {
        let name = function.name_any();

        let Some(namespace) = function.namespace() else {
            tracing::error!(%name, "Resource has no namespace. Aborting.");
            return Err(ReconcileError::Namespace);
        };

        Ok(Self { namespace, name })
    }
}

pub(crate) struct OperatorInner {
    config_location: ConfigLocation,
    functions: Arc<dyn Store<Function>>,
    config_maps: Arc<dyn Store<ConfigMap>>,
    services: Arc<dyn Store<KnativeService>>,
}

impl OperatorInner {
    pub(crate) fn new(
        config_location: ConfigLocation,
        functions: Arc<dyn Store<Function>>,
        config_maps: Arc<dyn Store<ConfigMap>>,
        services: Arc<dyn Store<KnativeService>>,
    ) -> Self {
        Self {
            config_location,
            functions,
            config_maps,
            services,
        }
    }

    /// One convergence pass. Everything is read again from the store, nothing is kept between passes.
    pub(crate) async fn reconcile(
        &self,
        request: &FunctionRequest,
    ) -> Result<Action, ReconcileError> {
        let FunctionRequest { namespace, name } = request;

        let runtime_info = self
            .load_runtime_info()
            .instrument(trace_span!("LoadRuntimeInfo"))
            .await?;

        let Some(function) = self
            .functions
            .get_opt(namespace, name)
            .await
            .map_err(ReconcileError::FunctionRead)?
        else {
            tracing::info!("Function not found. Assuming deleted. Owned resources are garbage collected.");
            return Ok(Action::await_change());
        };

        // The derived ConfigMap would overwrite the operator config
        if self.config_location.name == *name && self.config_location.namespace == *namespace {
            tracing::error!("Function name collides with the operator config. Aborting.");
            return Err(ReconcileError::ReservedName {
                namespace: namespace.clone(),
                name: name.clone(),
            });
        }

        let runtime = &function.spec.runtime;
        let Some(dockerfile_config_map) = runtime_info.docker_file_config_map_name(runtime) else {
            tracing::error!(%runtime, "Runtime is not configured. Aborting.");
            return Err(ReconcileError::UnknownRuntime {
                runtime: runtime.clone(),
            });
        };

        let config_map = self
            .check_config_map(&function)
            .instrument(trace_span!("CheckConfigMap"))
            .await
            .map_err(ReconcileError::ConfigMap)?;

        self.check_service(&function, &runtime_info, dockerfile_config_map, &config_map)
            .instrument(trace_span!("CheckService"))
            .await
            .map_err(ReconcileError::Service)?;

        tracing::info!("Awaiting change.");
        Ok(Action::await_change())
    }

    async fn load_runtime_info(&self) -> Result<RuntimeInfo, ReconcileError> {
        let ConfigLocation { name, namespace } = &self.config_location;

        tracing::info!(%name, %namespace, "Reading operator config.");

        let config_map = self
            .config_maps
            .get_opt(namespace, name)
            .await
            .map_err(|error| ReconcileError::ConfigRead {
                name: name.clone(),
                error,
            })?
            .ok_or_else(|| {
                tracing::error!(%name, %namespace, "Unable to read operator config.");
                ReconcileError::ConfigNotFound {
                    name: name.clone(),
                    namespace: namespace.clone(),
                }
            })?;

        RuntimeInfo::try_from(&config_map).map_err(ReconcileError::ConfigParse)
    }

    /// Returns the stored ConfigMap, created or updated if needed
    async fn check_config_map(&self, function: &Function) -> Result<ConfigMap, ConfigMapError> {
        tracing::info!("Checking if ConfigMap exists.");

        let desired = ConfigMap::try_from(function).map_err(ConfigMapError::Generate)?;
        let name = function.name_any();
        let namespace = function.namespace().unwrap_or_default();

        match self
            .config_maps
            .get_opt(&namespace, &name)
            .await
            .map_err(ConfigMapError::Get)?
        {
            None => {
                tracing::info!("ConfigMap does not exist. Creating.");

                let created = self
                    .config_maps
                    .create(&desired)
                    .await
                    .map_err(ConfigMapError::Create)?;

                tracing::info!("ConfigMap created.");
                Ok(created)
            }
            Some(mut found) => {
                let diffs = config_map_diffs(&desired, &found);

                if diffs.is_empty() {
                    tracing::info!("ConfigMap is up to date.");
                    return Ok(found);
                }

                tracing::info!(?diffs, "ConfigMap differs. Updating.");

                merge_owner_references(&mut found.metadata, &desired.metadata);
                found.data = desired.data;

                let updated = self
                    .config_maps
                    .replace(&found)
                    .await
                    .map_err(ConfigMapError::Update)?;

                tracing::info!("ConfigMap updated.");
                Ok(updated)
            }
        }
    }

    async fn check_service(
        &self,
        function: &Function,
        runtime_info: &RuntimeInfo,
        dockerfile_config_map: &str,
        source: &ConfigMap,
    ) -> Result<(), ServiceError> {
        tracing::info!("Checking if service exists.");

        let name = function.name_any();
        let namespace = function.namespace().unwrap_or_default();
        let registry = runtime_info.registry_info.as_str();
        let source_version = source.resource_version();

        let desired_with = |image: &ImageReference| {
            let builder = ServiceBuilder::new(
                image.to_string(),
                function,
                &runtime_info.service_account,
                dockerfile_config_map,
            )
            .with_source_version(source_version.clone());

            KnativeService::try_from(&builder).map_err(ServiceError::Generate)
        };

        let Some(mut found) = self
            .services
            .get_opt(&namespace, &name)
            .await
            .map_err(ServiceError::Get)?
        else {
            let image = ImageReference::generate(registry, &namespace, &name);
            tracing::info!(%image, "Service does not exist. Creating.");

            let desired = desired_with(&image)?;
            self.services
                .create(&desired)
                .await
                .map_err(ServiceError::Create)?;

            tracing::info!("Service created.");
            return Ok(());
        };

        // Compare with the tag the service already runs, a new tag only comes with a rebuild
        let current_image = found
            .spec
            .run_image()
            .and_then(|image| ImageReference::reuse(registry, &namespace, &name, image))
            .unwrap_or_else(|| ImageReference::generate(registry, &namespace, &name));

        let diffs = service_diffs(&desired_with(&current_image)?, &found);

        if diffs.is_empty() {
            tracing::info!(image = %current_image, "Service is up to date.");
            return Ok(());
        }

        let image = ImageReference::generate(registry, &namespace, &name);
        tracing::info!(?diffs, %image, "Service differs. Updating.");

        let desired = desired_with(&image)?;
        merge_owner_references(&mut found.metadata, &desired.metadata);
        found
            .annotations_mut()
            .extend(desired.metadata.annotations.unwrap_or_default());
        found.spec = desired.spec;

        self.services
            .replace(&found)
            .await
            .map_err(ServiceError::Update)?;

        tracing::info!("Service updated.");
        Ok(())
    }
}

pub struct Operator {
    client: KubeClient,
    inner: Arc<OperatorInner>,
}

impl Operator {
    pub fn new(client: KubeClient, config_location: ConfigLocation) -> Self {
        let store = Arc::new(KubeStore::new(client.clone()));
        let inner = Arc::new(OperatorInner::new(
            config_location,
            store.clone(),
            store.clone(),
            store,
        ));

        Self { client, inner }
    }

    pub async fn new_with_check_config_map(
        client: KubeClient,
        config_location: ConfigLocation,
    ) -> Self {
        tracing::info!("Checking if operator config exists.");
        let ConfigLocation { name, namespace } = &config_location;
        let config_map_api: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);

        match config_map_api.get_opt(name).await {
            Ok(Some(_)) => {
                tracing::info!(%name, %namespace, "Operator config exists.");
            }
            Ok(None) => {
                tracing::warn!(%name, %namespace, "Operator config does not exist. Functions will not be reconciled until it is created.");
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to check if operator config exists.");
            }
        }

        Self::new(client, config_location)
    }

    pub async fn run(self) {
        tracing::info!("Starting.");

        let api: Api<Function> = Api::all(self.client.clone());
        let config_map_api: Api<ConfigMap> = Api::all(self.client.clone());
        let service_api: Api<KnativeService> = Api::all(self.client);

        Controller::new(api, Config::default())
            .owns(config_map_api, Config::default())
            .owns(service_api, Config::default())
            .shutdown_on_signal()
            .run(reconcile, on_error, self.inner)
            .for_each(|reconciliation_result| async move {
                match reconciliation_result {
                    Ok(_) => {
                        tracing::info!("Reconciliation successful.");
                    }
                    Err(error) => {
                        tracing::error!(%error, "Reconciliation failed.");
                    }
                }
            })
            .await;

        tracing::info!("Terminated.");
    }
}

async fn reconcile(
    function: Arc<Function>,
    context: Arc<OperatorInner>,
) -> Result<Action, ReconcileError> {
    let request = FunctionRequest::try_from(function.as_ref())?;
    let FunctionRequest { namespace, name } = &request;

    context
        .reconcile(&request)
        .instrument(trace_span!("ReconcileResource", %name, %namespace))
        .await
}

/// Requeue delay after a failed pass
pub fn requeue_delay(error: &ReconcileError) -> Duration {
    match error {
        // Needs someone to fix a resource
        error if error.is_configuration_error() => Duration::from_secs(60),
        ReconcileError::ConfigNotFound { .. } => Duration::from_secs(15),
        _ => Duration::from_secs(10),
    }
}

fn on_error(_function: Arc<Function>, error: &ReconcileError, _context: Arc<OperatorInner>) -> Action {
    let delay = requeue_delay(error);
    tracing::error!(%error, ?delay, "Reconciliation failed. Requeuing.");

    Action::requeue(delay)
}
