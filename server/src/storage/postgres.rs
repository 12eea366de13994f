//! `PostgreSQL` Storage Backend
//!
//! One row per logical collection in the `secure_store` table. Values are
//! JSONB; writes are upserts so last-write-wins matches the in-memory
//! backend.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::OwnedMutexGuard;

use super::{KeyLocks, SecureStorage, StorageError};

/// `PostgreSQL`-backed `SecureStorage` implementation.
///
/// Mutation locks are per process; the deployment runs one server instance
/// per store.
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
    locks: KeyLocks,
}

impl PgStorage {
    /// Wrap an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            locks: KeyLocks::default(),
        }
    }

    async fn upsert(&self, key: &str, value: Value, temporary: bool) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO secure_store (key, value, temporary, updated_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (key) DO UPDATE
             SET value = EXCLUDED.value,
                 temporary = EXCLUDED.temporary,
                 updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .bind(temporary)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SecureStorage for PgStorage {
    async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()> {
        self.locks.acquire(key).await
    }

    async fn get_item(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let value: Option<Value> =
            sqlx::query_scalar("SELECT value FROM secure_store WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.upsert(key, value, false).await
    }

    async fn set_temp_item(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.upsert(key, value, true).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM secure_store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        // LIKE with an escaped prefix; keys contain no wildcard characters.
        let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
        let keys: Vec<String> =
            sqlx::query_scalar("SELECT key FROM secure_store WHERE key LIKE $1 ESCAPE '\\'")
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?;
        Ok(keys)
    }

    async fn purge_temp_items(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM secure_store WHERE temporary")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
