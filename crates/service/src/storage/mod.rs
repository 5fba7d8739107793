//! Storage abstractions for service layer
//!
//! A namespaced byte-oriented key-value interface (`KvStore`) plus the
//! backends shipped with the services: a JSON file per namespace and an
//! in-process map.

pub mod json_map_store;
pub mod file_store;
pub mod memory_store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::ServiceError;

pub use file_store::{FileKvStore, FileStoreProvider};
pub use memory_store::{MemoryKvStore, MemoryStoreProvider};

/// Key-value store scoped to one namespace.
///
/// `get` on an absent key returns `ServiceError::NotFound`; every other
/// failure is `ServiceError::Storage`. Dropping the handle closes it.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, ServiceError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, ServiceError>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), ServiceError>;
}

/// Opens namespaced store handles.
#[async_trait]
pub trait KvStoreProvider: Send + Sync {
    async fn open(&self, namespace: &str) -> Result<Arc<dyn KvStore>, ServiceError>;
}

/// Read and decode a JSON value; `Ok(None)` when the key is absent.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, ServiceError> {
    if !store.exists(key).await? {
        return Ok(None);
    }
    let raw = match store.get(key).await {
        Ok(raw) => raw,
        Err(ServiceError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    let value = serde_json::from_slice(&raw).map_err(ServiceError::storage)?;
    Ok(Some(value))
}

/// Encode a value as JSON and write it with a single `set`.
pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> Result<(), ServiceError> {
    let raw = serde_json::to_vec(value).map_err(ServiceError::storage)?;
    store.set(key, raw).await
}
