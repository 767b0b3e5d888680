//! In-memory tier directory.
//!
//! Acts as both a `TierSource` and the `TierAdmin` write side, so a single
//! instance can back the resolver and the webhook handler in tests and
//! single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::tier::{Tier, TierRow};
use crate::ports::{TierAdmin, TierSource, TierSourceError};

/// Thread-safe in-memory tier table.
#[derive(Default)]
pub struct InMemoryTierDirectory {
    rows: Mutex<HashMap<String, TierRow>>,
}

impl InMemoryTierDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a row directly. Test helper.
    pub fn insert(&self, user_id: &UserId, row: TierRow) {
        self.rows.lock().unwrap().insert(user_id.to_string(), row);
    }
}

#[async_trait]
impl TierSource for InMemoryTierDirectory {
    fn name(&self) -> &str {
        "memory"
    }

    async fn lookup(&self, user_id: &UserId) -> Result<Option<TierRow>, TierSourceError> {
        Ok(self.rows.lock().unwrap().get(user_id.as_str()).cloned())
    }
}

#[async_trait]
impl TierAdmin for InMemoryTierDirectory {
    async fn set_tier(
        &self,
        user_id: &UserId,
        tier: Tier,
        paid_until: Option<Timestamp>,
    ) -> Result<(), TierSourceError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.entry(user_id.to_string()).or_default();
        row.tier = Some(tier);
        row.paid_until = paid_until;
        Ok(())
    }

    async fn clear_tier(&self, user_id: &UserId) -> Result<(), TierSourceError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get_mut(user_id.as_str()) {
            row.tier = None;
            row.paid_until = None;
        }
        Ok(())
    }
}
