use super::{Store, StoreError};
use async_trait::async_trait;
use kube::{core::ErrorResponse, Error as KubeError, Resource};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Key = (String, String);

/// In memory [`Store`] behaving like the API server for the calls the operator makes.
/// Resource versions are shared between all stores cloned from the same [`ResourceVersions`].
pub(crate) struct MemoryStore<K> {
    objects: Mutex<BTreeMap<Key, K>>,
    resource_versions: ResourceVersions,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

#[derive(Clone, Default)]
pub(crate) struct ResourceVersions(Arc<AtomicU64>);

impl ResourceVersions {
    fn next(&self) -> String {
        (self.0.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

fn api_error(code: u16, reason: &str, message: String) -> StoreError {
    StoreError::Kube(KubeError::Api(ErrorResponse {
        status: String::from("Failure"),
        message,
        reason: reason.to_string(),
        code,
    }))
}

fn key_of<K: Resource>(object: &K) -> Key {
    let meta = object.meta();
    (
        meta.namespace.clone().unwrap_or_default(),
        meta.name.clone().unwrap_or_default(),
    )
}

impl<K> MemoryStore<K>
where
    K: Resource + Clone,
{
    pub(crate) fn new(resource_versions: ResourceVersions) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            resource_versions,
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Stores `object` directly, as if written by someone else.
    pub(crate) fn insert(&self, mut object: K) -> K {
        object.meta_mut().resource_version = Some(self.resource_versions.next());
        self.objects
            .lock()
            .unwrap()
            .insert(key_of(&object), object.clone());
        object
    }

    pub(crate) fn remove(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()))
    }

    pub(crate) fn get(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of successful creates and replaces
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub(crate) fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(api_error(
                503,
                "ServiceUnavailable",
                String::from("the server is currently unable to handle the request"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<K> Store<K> for MemoryStore<K>
where
    K: Resource + Clone + Send + Sync + 'static,
{
    async fn get_opt(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        Ok(self.get(namespace, name))
    }

    async fn create(&self, object: &K) -> Result<K, StoreError> {
        self.check_writable()?;

        let key = key_of(object);
        let mut objects = self.objects.lock().unwrap();

        if objects.contains_key(&key) {
            return Err(api_error(
                409,
                "AlreadyExists",
                format!("{:?} already exists", key),
            ));
        }

        let mut created = object.clone();
        created.meta_mut().resource_version = Some(self.resource_versions.next());
        objects.insert(key, created.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(created)
    }

    async fn replace(&self, object: &K) -> Result<K, StoreError> {
        self.check_writable()?;

        let key = key_of(object);
        let mut objects = self.objects.lock().unwrap();

        let Some(current) = objects.get(&key) else {
            return Err(api_error(404, "NotFound", format!("{:?} not found", key)));
        };

        if object.meta().resource_version != current.meta().resource_version {
            return Err(api_error(
                409,
                "Conflict",
                format!("the object {:?} has been modified", key),
            ));
        }

        let mut replaced = object.clone();
        replaced.meta_mut().resource_version = Some(self.resource_versions.next());
        objects.insert(key, replaced.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(replaced)
    }
}
