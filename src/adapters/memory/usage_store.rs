//! In-memory usage store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::UserId;
use crate::domain::usage::UsageData;
use crate::ports::{UsageStore, UsageStoreError};

/// Thread-safe in-memory usage record table.
#[derive(Default)]
pub struct InMemoryUsageStore {
    records: Mutex<HashMap<String, UsageData>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<UsageData>, UsageStoreError> {
        Ok(self.records.lock().unwrap().get(user_id.as_str()).cloned())
    }

    async fn save(&self, user_id: &UserId, data: &UsageData) -> Result<(), UsageStoreError> {
        self.records
            .lock()
            .unwrap()
            .insert(user_id.to_string(), data.clone());
        Ok(())
    }
}
