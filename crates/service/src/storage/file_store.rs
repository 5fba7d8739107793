use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;
use crate::storage::{KvStore, KvStoreProvider};

/// One namespace persisted as `<data_dir>/<namespace>.json`.
#[derive(Clone)]
pub struct FileKvStore {
    store: Arc<JsonMapStore<String, Vec<u8>>>,
}

impl FileKvStore {
    /// Initialize the store from the given file path. Creates the file if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, Vec<u8>>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn exists(&self, key: &str) -> Result<bool, ServiceError> {
        Ok(self.store.contains_key(&key.to_string()).await)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ServiceError> {
        self.store
            .get(&key.to_string())
            .await
            .ok_or_else(|| ServiceError::not_found(&format!("key {key}")))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), ServiceError> {
        debug!(key, bytes = value.len(), file = %self.store.file_path().display(), "kv set");
        self.store.insert(key.to_string(), value).await
    }
}

/// Hands out file-backed namespaces under one data directory.
///
/// Opening the same namespace twice returns the same handle, so all
/// writers in the process share one in-memory view of the file.
pub struct FileStoreProvider {
    data_dir: PathBuf,
    opened: Mutex<HashMap<String, Arc<FileKvStore>>>,
}

impl FileStoreProvider {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self { data_dir: data_dir.into(), opened: Mutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl KvStoreProvider for FileStoreProvider {
    async fn open(&self, namespace: &str) -> Result<Arc<dyn KvStore>, ServiceError> {
        if namespace.is_empty() || namespace.contains(['/', '\\']) || namespace.contains("..") {
            return Err(ServiceError::Validation(format!("invalid namespace {namespace:?}")));
        }
        let mut opened = self.opened.lock().await;
        if let Some(store) = opened.get(namespace) {
            return Ok(store.clone());
        }
        let path = self.data_dir.join(format!("{namespace}.json"));
        let store = FileKvStore::new(&path).await?;
        info!(namespace, path = %path.display(), "opened file kv namespace");
        opened.insert(namespace.to_string(), store.clone());
        Ok(store)
    }
}
