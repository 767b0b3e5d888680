//! Per-user usage counters with lazy period resets.
//!
//! One `UsageData` per user. Counters increase monotonically inside a
//! period and are zeroed lazily when a load observes that the period
//! boundary has passed. Lifetime totals never reset.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::Timestamp;
use crate::domain::tier::Tier;

use super::FeatureType;

/// Usage counters for one user across all features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageData {
    /// Consumption within the current period, per feature.
    #[serde(default)]
    counters: HashMap<FeatureType, u32>,
    /// When each feature's counter was last reset.
    #[serde(default)]
    last_reset: HashMap<FeatureType, Timestamp>,
    /// Running totals that survive resets.
    #[serde(default)]
    lifetime_totals: HashMap<FeatureType, u32>,
}

impl UsageData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current period usage for a feature.
    pub fn usage_for(&self, feature: FeatureType) -> u32 {
        self.counters.get(&feature).copied().unwrap_or(0)
    }

    /// Lifetime usage for a feature.
    pub fn lifetime_for(&self, feature: FeatureType) -> u32 {
        self.lifetime_totals.get(&feature).copied().unwrap_or(0)
    }

    /// Last reset timestamp for a feature, if one was ever recorded.
    pub fn last_reset_for(&self, feature: FeatureType) -> Option<Timestamp> {
        self.last_reset.get(&feature).copied()
    }

    /// Zeroes any counter whose period boundary has passed and advances its
    /// reset timestamp to `now`. Returns true if anything changed, so the
    /// caller knows whether to persist.
    pub fn apply_resets(&mut self, tier: Tier, now: Timestamp) -> bool {
        let mut changed = false;
        for feature in FeatureType::ALL {
            let cadence = feature.cadence(tier);
            if let Some(last) = self.last_reset.get(&feature).copied() {
                if cadence.is_due(&last, &now) {
                    self.counters.insert(feature, 0);
                    self.last_reset.insert(feature, now);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Adds `cost` to the feature's period counter and lifetime total.
    ///
    /// The reset timestamp is seeded on first use so the next period
    /// boundary is measured from the first recorded generation.
    pub fn record(&mut self, feature: FeatureType, cost: u32, now: Timestamp) {
        *self.counters.entry(feature).or_insert(0) += cost;
        *self.lifetime_totals.entry(feature).or_insert(0) += cost;
        self.last_reset.entry(feature).or_insert(now);
    }

    /// Force-sets a counter and its reset timestamp. Test/backfill helper.
    pub fn set_usage(&mut self, feature: FeatureType, used: u32, last_reset: Timestamp) {
        self.counters.insert(feature, used);
        self.last_reset.insert(feature, last_reset);
    }
}
