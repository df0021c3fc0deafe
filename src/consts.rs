use const_format::concatcp;

pub const CONFIG_MAP_NAME_ENV_VAR: &str = "CONTROLLER_CONFIGMAP";
pub const CONFIG_MAP_DEFAULT_NAME: &str = "fn-config";

pub const CONFIG_MAP_NAMESPACE_ENV_VAR: &str = "CONTROLLER_CONFIGMAP_NS";
pub const CONFIG_MAP_DEFAULT_NAMESPACE: &str = "default";

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

pub const GROUP: &str = "runtime.operato.rs";

/// Resource version of the ConfigMap a Service was last built from.
pub const SOURCE_VERSION_ANNOTATION: &str = concatcp!(GROUP, "/source-version");

pub const DEFAULT_LOG_FILTER: &str = concatcp!(PKG_NAME, "=info,kube=warn");

// Keys of the operator ConfigMap
pub const DOCKER_REGISTRY_KEY: &str = "dockerRegistry";
pub const SERVICE_ACCOUNT_NAME_KEY: &str = "serviceAccountName";
pub const RUNTIMES_KEY: &str = "runtimes";

// Keys of the derived ConfigMap
pub const HANDLER_KEY: &str = "handler";
pub const HANDLER_VALUE: &str = "handler.main";
pub const SOURCE_KEY: &str = "handler.js";
pub const DEPS_KEY: &str = "package.json";
pub const DEFAULT_DEPS: &str = "{}";

pub const DEFAULT_FUNCTION_TIMEOUT: i32 = 180;

pub const BUILDER_IMAGE: &str = "gcr.io/kaniko-project/executor";
pub const BUILD_STEP_NAME: &str = "build-and-push";

pub const DOCKERFILE_VOLUME_NAME: &str = "dockerfile-vol";
pub const DOCKERFILE_VOLUME_MOUNT_PATH: &str = "/workspace";
pub const FUNCTION_VOLUME_NAME: &str = "func-vol";
pub const FUNCTION_VOLUME_MOUNT_PATH: &str = "/src";
/// 0644
pub const VOLUME_DEFAULT_MODE: i32 = 420;

pub const DOCKERFILE_ARG: &str = concatcp!("--dockerfile=", DOCKERFILE_VOLUME_MOUNT_PATH, "/Dockerfile");
pub const DESTINATION_ARG_PREFIX: &str = "--destination=";

pub const IMAGE_TAG_LEN: usize = 8;
