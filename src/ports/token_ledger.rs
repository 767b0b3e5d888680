//! TokenLedger port - consumable token credit balances.

use async_trait::async_trait;

use crate::domain::foundation::UserId;

/// Port for reading and mutating a user's token balance.
///
/// Paid generations deduct tokens after success; webhook token grants add
/// them. Balances never go negative.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Current balance. Unknown users have a zero balance.
    async fn balance(&self, user_id: &UserId) -> Result<u64, TokenLedgerError>;

    /// Deducts `amount` tokens, returning the new balance.
    ///
    /// Fails with `InsufficientBalance` rather than going negative.
    async fn deduct(&self, user_id: &UserId, amount: u64) -> Result<u64, TokenLedgerError>;

    /// Grants `amount` tokens, returning the new balance.
    async fn grant(&self, user_id: &UserId, amount: u64) -> Result<u64, TokenLedgerError>;
}

/// Errors from the token ledger.
#[derive(Debug, thiserror::Error)]
pub enum TokenLedgerError {
    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: u64, required: u64 },

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for TokenLedgerError {
    fn from(err: sqlx::Error) -> Self {
        TokenLedgerError::Database(err.to_string())
    }
}
