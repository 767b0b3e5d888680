//! In-memory token ledger.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::UserId;
use crate::ports::{TokenLedger, TokenLedgerError};

/// Thread-safe in-memory balance table.
#[derive(Default)]
pub struct InMemoryTokenLedger {
    balances: Mutex<HashMap<String, u64>>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a balance directly. Test helper.
    pub fn set_balance(&self, user_id: &UserId, balance: u64) {
        self.balances
            .lock()
            .unwrap()
            .insert(user_id.to_string(), balance);
    }
}

#[async_trait]
impl TokenLedger for InMemoryTokenLedger {
    async fn balance(&self, user_id: &UserId) -> Result<u64, TokenLedgerError> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(user_id.as_str())
            .copied()
            .unwrap_or(0))
    }

    async fn deduct(&self, user_id: &UserId, amount: u64) -> Result<u64, TokenLedgerError> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(user_id.to_string()).or_insert(0);
        if *balance < amount {
            return Err(TokenLedgerError::InsufficientBalance {
                balance: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        Ok(*balance)
    }

    async fn grant(&self, user_id: &UserId, amount: u64) -> Result<u64, TokenLedgerError> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(user_id.to_string()).or_insert(0);
        *balance += amount;
        Ok(*balance)
    }
}
