//! Typed access to the objects the operator reads and writes.

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Api, PostParams},
    Client as KubeClient, Error as KubeError, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Kubernetes error: {0}")]
    Kube(
        #[from]
        #[source]
        KubeError,
    ),
    #[error("MissingObjectKey: {0}")]
    MissingObjectKey(&'static str),
}

/// Namespaced get/create/replace for one kind of object.
///
/// `replace` sends the object's resource version, so a replace based on a stale
/// read fails with a conflict instead of overwriting a concurrent write.
#[async_trait]
pub trait Store<K>: Send + Sync
where
    K: Send + Sync + 'static,
{
    async fn get_opt(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError>;

    async fn create(&self, object: &K) -> Result<K, StoreError>;

    async fn replace(&self, object: &K) -> Result<K, StoreError>;
}

/// [`Store`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: KubeClient,
}

impl KubeStore {
    pub fn new(client: KubeClient) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn object_namespace<K: Resource>(object: &K) -> Result<String, StoreError> {
    object
        .namespace()
        .ok_or(StoreError::MissingObjectKey(".metadata.namespace"))
}

#[async_trait]
impl<K> Store<K> for KubeStore
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize
        + Send
        + Sync
        + 'static,
{
    async fn get_opt(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        Ok(self.api::<K>(namespace).get_opt(name).await?)
    }

    async fn create(&self, object: &K) -> Result<K, StoreError> {
        let namespace = object_namespace(object)?;

        Ok(self
            .api::<K>(&namespace)
            .create(&PostParams::default(), object)
            .await?)
    }

    async fn replace(&self, object: &K) -> Result<K, StoreError> {
        let namespace = object_namespace(object)?;
        let name = object
            .meta()
            .name
            .clone()
            .ok_or(StoreError::MissingObjectKey(".metadata.name"))?;

        Ok(self
            .api::<K>(&namespace)
            .replace(&name, &PostParams::default(), object)
            .await?)
    }
}
