//! In-Memory Storage Backend
//!
//! Dashmap-backed implementation used in demo mode and tests. State is lost
//! on restart.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use super::{KeyLocks, SecureStorage, StorageError};

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    temporary: bool,
}

/// In-memory `SecureStorage` implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<DashMap<String, Entry>>,
    locks: KeyLocks,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureStorage for MemoryStorage {
    async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()> {
        self.locks.acquire(key).await
    }

    async fn get_item(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(key).map(|e| e.value.clone()))
    }

    async fn set_item(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                temporary: false,
            },
        );
        Ok(())
    }

    async fn set_temp_item(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                temporary: true,
            },
        );
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect())
    }

    async fn purge_temp_items(&self) -> Result<u64, StorageError> {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.temporary);
        Ok((before - self.entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let store = MemoryStorage::new();
        store.set_item("k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap(), Some(json!({"a": 1})));

        store.remove_item("k").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap(), None);
        // removing again is fine
        store.remove_item("k").await.unwrap();
    }

    #[tokio::test]
    async fn purge_only_removes_temp_entries() {
        let store = MemoryStorage::new();
        store.set_item("keep", json!(1)).await.unwrap();
        store.set_temp_item("drop", json!(2)).await.unwrap();

        let purged = store.purge_temp_items().await.unwrap();
        assert_eq!(purged, 1);
        assert!(store.get_item("keep").await.unwrap().is_some());
        assert!(store.get_item("drop").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_keys_filters_by_prefix() {
        let store = MemoryStorage::new();
        store.set_item("gdpr_consent_a", json!([])).await.unwrap();
        store.set_item("gdpr_consent_b", json!([])).await.unwrap();
        store.set_item("gdpr_requests", json!([])).await.unwrap();

        let mut keys = store.list_keys("gdpr_consent_").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["gdpr_consent_a", "gdpr_consent_b"]);
    }
}
