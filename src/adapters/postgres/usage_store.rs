//! PostgreSQL usage store.
//!
//! One JSONB row per user. The record is small and rewritten whole; the
//! upsert gives row-level atomicity but no read-modify-write locking, which
//! matches the accepted best-effort accounting model.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::UserId;
use crate::domain::usage::UsageData;
use crate::ports::{UsageStore, UsageStoreError};

pub struct PgUsageStore {
    pool: PgPool,
}

impl PgUsageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<UsageData>, UsageStoreError> {
        let row = sqlx::query("SELECT data FROM usage_records WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: serde_json::Value = row.try_get("data")?;
        let data = serde_json::from_value(value)
            .map_err(|e| UsageStoreError::Corrupt(e.to_string()))?;
        Ok(Some(data))
    }

    async fn save(&self, user_id: &UserId, data: &UsageData) -> Result<(), UsageStoreError> {
        let value = serde_json::to_value(data)
            .map_err(|e| UsageStoreError::Corrupt(e.to_string()))?;

        sqlx::query(
            "INSERT INTO usage_records (user_id, data, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET data = $2, updated_at = NOW()",
        )
        .bind(user_id.as_str())
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
