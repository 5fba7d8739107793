use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::errors::ServiceError;
use crate::storage::{KvStore, KvStoreProvider};

/// In-process namespace; contents are lost when the last handle drops.
#[derive(Default)]
pub struct MemoryKvStore {
    inner: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self { Self::default() }

    /// Raw bytes under `key`, if any. Mostly useful for assertions.
    pub async fn snapshot(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize { self.inner.read().await.len() }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn exists(&self, key: &str) -> Result<bool, ServiceError> {
        Ok(self.inner.read().await.contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ServiceError> {
        self.inner
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(&format!("key {key}")))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), ServiceError> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStoreProvider {
    opened: Mutex<HashMap<String, Arc<MemoryKvStore>>>,
}

impl MemoryStoreProvider {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl KvStoreProvider for MemoryStoreProvider {
    async fn open(&self, namespace: &str) -> Result<Arc<dyn KvStore>, ServiceError> {
        let mut opened = self.opened.lock().await;
        let store = opened.entry(namespace.to_string()).or_default().clone();
        Ok(store)
    }
}
