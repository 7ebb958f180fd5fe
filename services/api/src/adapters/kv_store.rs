//! services/api/src/adapters/kv_store.rs
//!
//! This module contains the PostgreSQL implementation of the `KeyValueStore` port from
//! the `core` crate. Each client's favorites and profile live as one row per record key.

use async_trait::async_trait;
use soul_whispers_core::ports::{KeyValueStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `KeyValueStore` port.
#[derive(Clone)]
pub struct PgKeyValueStore {
    pool: PgPool,
}

impl PgKeyValueStore {
    /// Creates a new `PgKeyValueStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct RecordRow {
    record_value: String,
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for PgKeyValueStore {
    async fn get(&self, client_id: Uuid, key: &str) -> PortResult<Option<String>> {
        let row = sqlx::query_as::<_, RecordRow>(
            "SELECT record_value FROM local_records WHERE client_id = $1 AND record_key = $2",
        )
        .bind(client_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(|r| r.record_value))
    }

    async fn put(&self, client_id: Uuid, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO local_records (client_id, record_key, record_value, updated_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (client_id, record_key) \
             DO UPDATE SET record_value = EXCLUDED.record_value, updated_at = NOW()",
        )
        .bind(client_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn remove(&self, client_id: Uuid, key: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM local_records WHERE client_id = $1 AND record_key = $2")
            .bind(client_id)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
