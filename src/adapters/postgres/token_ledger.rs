//! PostgreSQL token ledger over the `paid_tiers.token_balance` column.
//!
//! Deduction uses a single conditional UPDATE so the balance check and the
//! decrement are atomic at the row level.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::UserId;
use crate::ports::{TokenLedger, TokenLedgerError};

pub struct PgTokenLedger {
    pool: PgPool,
}

impl PgTokenLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenLedger for PgTokenLedger {
    async fn balance(&self, user_id: &UserId) -> Result<u64, TokenLedgerError> {
        let row = sqlx::query("SELECT token_balance FROM paid_tiers WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let balance: i64 = match row {
            Some(row) => row.try_get::<Option<i64>, _>("token_balance")?.unwrap_or(0),
            None => 0,
        };
        Ok(balance.max(0) as u64)
    }

    async fn deduct(&self, user_id: &UserId, amount: u64) -> Result<u64, TokenLedgerError> {
        let row = sqlx::query(
            "UPDATE paid_tiers SET token_balance = token_balance - $2 \
             WHERE user_id = $1 AND token_balance >= $2 \
             RETURNING token_balance",
        )
        .bind(user_id.as_str())
        .bind(amount as i64)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let balance: i64 = row.try_get("token_balance")?;
                Ok(balance.max(0) as u64)
            }
            None => {
                let balance = self.balance(user_id).await?;
                Err(TokenLedgerError::InsufficientBalance {
                    balance,
                    required: amount,
                })
            }
        }
    }

    async fn grant(&self, user_id: &UserId, amount: u64) -> Result<u64, TokenLedgerError> {
        let row = sqlx::query(
            "INSERT INTO paid_tiers (user_id, token_balance) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET token_balance = \
                 COALESCE(paid_tiers.token_balance, 0) + $2 \
             RETURNING token_balance",
        )
        .bind(user_id.as_str())
        .bind(amount as i64)
        .fetch_one(&self.pool)
        .await?;

        let balance: i64 = row.try_get("token_balance")?;
        Ok(balance.max(0) as u64)
    }
}
