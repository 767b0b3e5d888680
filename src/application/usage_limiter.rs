//! Usage limiter - quota checks and consumption recording over the store.
//!
//! Loads the user's usage record, applies lazy period resets, and decides
//! whether a generation may proceed. Recording is a separate call made only
//! after the generation succeeded.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::tier::Tier;
use crate::domain::usage::{
    DenialReason, FeatureType, LimitDecision, ModelCostTable, QuotaTable, UsageData,
};
use crate::ports::{UsageStore, UsageStoreError};

/// Per-feature usage snapshot for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureUsage {
    pub feature: FeatureType,
    pub used: u32,
    pub remaining: u32,
    pub limit: u32,
}

/// Enforces tier quotas and records consumption.
pub struct UsageLimiter {
    store: Arc<dyn UsageStore>,
    quotas: QuotaTable,
    costs: ModelCostTable,
}

impl UsageLimiter {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self {
            store,
            quotas: QuotaTable::new(),
            costs: ModelCostTable::new(),
        }
    }

    /// Decides whether the user may run one generation of `feature` with
    /// `model` at their tier.
    pub async fn check(
        &self,
        user_id: &UserId,
        tier: Tier,
        feature: FeatureType,
        model: Option<&str>,
    ) -> Result<LimitDecision, UsageStoreError> {
        let limit = self.quotas.quota_for(tier, feature);
        if limit == 0 {
            return Ok(LimitDecision::Denied(DenialReason::RequiresUpgrade {
                feature,
                tier,
            }));
        }

        let data = self.load_fresh(user_id, tier).await?;
        let used = data.usage_for(feature);
        let remaining = limit.saturating_sub(used);
        let cost = self.costs.cost_for(model);

        if remaining < cost {
            debug!(
                user_id = %user_id,
                feature = %feature,
                used,
                limit,
                cost,
                "quota exhausted"
            );
            return Ok(LimitDecision::Denied(DenialReason::QuotaExhausted {
                feature,
                remaining,
                limit,
                cost,
            }));
        }

        Ok(LimitDecision::Allowed { remaining, limit })
    }

    /// Records one successful generation: increments the period counter by
    /// the model cost and persists.
    pub async fn record(
        &self,
        user_id: &UserId,
        tier: Tier,
        feature: FeatureType,
        model: Option<&str>,
    ) -> Result<(), UsageStoreError> {
        let now = Timestamp::now();
        let mut data = self
            .store
            .load(user_id)
            .await?
            .unwrap_or_else(UsageData::new);
        data.apply_resets(tier, now);

        let cost = self.costs.cost_for(model);
        data.record(feature, cost, now);
        self.store.save(user_id, &data).await
    }

    /// Remaining/limit per feature for UI display.
    pub async fn overview(
        &self,
        user_id: &UserId,
        tier: Tier,
    ) -> Result<Vec<FeatureUsage>, UsageStoreError> {
        let data = self.load_fresh(user_id, tier).await?;
        Ok(FeatureType::ALL
            .into_iter()
            .map(|feature| {
                let limit = self.quotas.quota_for(tier, feature);
                let used = data.usage_for(feature);
                FeatureUsage {
                    feature,
                    used,
                    remaining: limit.saturating_sub(used),
                    limit,
                }
            })
            .collect())
    }

    /// Loads usage data with lazy resets applied. When a reset fired, the
    /// zeroed record is persisted so the advanced timestamps stick; a save
    /// failure here only delays the reset to the next load, so it is logged
    /// and swallowed.
    async fn load_fresh(&self, user_id: &UserId, tier: Tier) -> Result<UsageData, UsageStoreError> {
        let mut data = self
            .store
            .load(user_id)
            .await?
            .unwrap_or_else(UsageData::new);

        if data.apply_resets(tier, Timestamp::now()) {
            if let Err(err) = self.store.save(user_id, &data).await {
                warn!(
                    user_id = %user_id,
                    error = %err,
                    "failed to persist reset usage record"
                );
            }
        }

        Ok(data)
    }
}
