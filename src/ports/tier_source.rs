//! TierSource port - one candidate source of subscription data.
//!
//! The resolver walks an ordered list of these; the first source that
//! returns a row wins. Sources differ in schema (paid-tier table, free-tier
//! table, legacy profiles), so they all answer with the loose [`TierRow`].

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::tier::TierRow;

/// Port for reading raw tier data from one backing table.
#[async_trait]
pub trait TierSource: Send + Sync {
    /// Name used in fallback diagnostics ("paid_tiers", "profiles", ...).
    fn name(&self) -> &str;

    /// Looks up the user in this source. `Ok(None)` means "not here, try
    /// the next source"; errors are logged by the resolver and treated the
    /// same way.
    async fn lookup(&self, user_id: &UserId) -> Result<Option<TierRow>, TierSourceError>;
}

/// Errors from a tier source.
#[derive(Debug, thiserror::Error)]
pub enum TierSourceError {
    #[error("database error: {0}")]
    Database(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for TierSourceError {
    fn from(err: sqlx::Error) -> Self {
        TierSourceError::Database(err.to_string())
    }
}
