//! Secure Storage Seam
//!
//! Generic persistent key-value interface the governance services are built
//! against. Two backends: `PostgreSQL` for production and an in-memory map
//! for demo mode and tests. Services treat the store as a black box and make
//! no assumptions about the backing medium.

mod keys;
mod memory;
mod postgres;

pub use keys::*;
pub use memory::MemoryStorage;
pub use postgres::PgStorage;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Storage-layer error types.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing store failed.
    #[error("Storage backend error")]
    Backend(#[from] sqlx::Error),

    /// A stored value failed to deserialize into its expected shape.
    #[error("Corrupt value under key '{key}': {reason}")]
    Corrupt {
        /// Key whose value was unreadable.
        key: String,
        /// Decode failure detail.
        reason: String,
    },

    /// A value failed to serialize before writing.
    #[error("Failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Per-key mutation locks shared by a storage instance.
///
/// Stored collections are mutated as read-modify-write sequences; writers
/// take the key's lock before the read and hold it across the write, so
/// concurrent requests cannot overwrite each other's appends.
#[derive(Debug, Clone, Default)]
pub struct KeyLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    /// Take the lock for `key`, creating it on first use.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_default()
            .value()
            .clone();
        lock.lock_owned().await
    }
}

/// Generic persistent key-value store for governance state.
#[async_trait]
pub trait SecureStorage: Send + Sync {
    /// Take the mutation lock for `key`.
    ///
    /// Every read-modify-write of a stored collection holds the returned
    /// guard from before the read until after the write.
    async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()>;

    /// Read the value stored under `key`, if any.
    async fn get_item(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Write `value` under `key`, replacing any existing value.
    async fn set_item(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Write a session-scoped value under `key`. Temporary entries are purged
    /// at startup.
    async fn set_temp_item(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Remove the value under `key`. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// All keys starting with `prefix`, unordered.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Purge all session-scoped entries.
    async fn purge_temp_items(&self) -> Result<u64, StorageError>;
}

/// Read the list stored under `key`, defaulting to empty when absent.
pub async fn read_list<T: DeserializeOwned>(
    store: &dyn SecureStorage,
    key: &str,
) -> Result<Vec<T>, StorageError> {
    match store.get_item(key).await? {
        Some(value) => serde_json::from_value(value).map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(Vec::new()),
    }
}

/// Replace the list stored under `key`.
pub async fn write_list<T: Serialize>(
    store: &dyn SecureStorage,
    key: &str,
    items: &[T],
) -> Result<(), StorageError> {
    let value = serde_json::to_value(items)?;
    store.set_item(key, value).await
}

/// Read a single typed object stored under `key`.
pub async fn read_object<T: DeserializeOwned>(
    store: &dyn SecureStorage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get_item(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Write a single typed object under `key`.
pub async fn write_object<T: Serialize>(
    store: &dyn SecureStorage,
    key: &str,
    object: &T,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(object)?;
    store.set_item(key, value).await
}
