//! UsageStore port - persisted per-user usage counters.
//!
//! The server-side store is the single source of truth for usage; clients
//! only ever see read-through views of it.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::usage::UsageData;

/// Port for loading and saving a user's usage record.
///
/// Read-modify-write without optimistic locking: concurrent generations by
/// the same user can race and miscount slightly. Accepted as best-effort
/// accounting, not a billing-grade ledger.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Loads the user's usage record, if one exists.
    async fn load(&self, user_id: &UserId) -> Result<Option<UsageData>, UsageStoreError>;

    /// Persists the user's usage record, replacing any previous one.
    async fn save(&self, user_id: &UserId, data: &UsageData) -> Result<(), UsageStoreError>;
}

/// Errors from the usage store.
#[derive(Debug, thiserror::Error)]
pub enum UsageStoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("corrupt usage record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for UsageStoreError {
    fn from(err: sqlx::Error) -> Self {
        UsageStoreError::Database(err.to_string())
    }
}
