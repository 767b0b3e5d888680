//! Tier-to-quota tables and limit decisions.
//!
//! Defines how many uses of each feature a tier gets per reset period, and
//! the structured allow/deny result the limiter hands back to callers.

use serde::{Deserialize, Serialize};

use crate::domain::tier::Tier;

use super::FeatureType;

/// Static tier → feature quota table.
///
/// A quota of 0 means the feature is not included in the tier at all and the
/// user must upgrade. Quotas count generations per reset period (see
/// [`FeatureType::cadence`]); free-tier heavy features are lifetime totals.
///
/// | Feature | Free | Starter | Pro | Premium |
/// |---------|------|---------|-----|---------|
/// | message | 10   | 100     | 500 | 2000    |
/// | image   | 3    | 30      | 100 | 400     |
/// | video   | 1    | 5       | 20  | 60      |
/// | music   | 2    | 10      | 40  | 120     |
/// | ppt     | 0    | 5       | 20  | 50      |
/// | tts     | 5    | 50      | 200 | 500     |
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaTable;

impl QuotaTable {
    pub fn new() -> Self {
        Self
    }

    /// Quota for a feature at a tier.
    pub fn quota_for(&self, tier: Tier, feature: FeatureType) -> u32 {
        match (tier, feature) {
            (Tier::Free, FeatureType::Message) => 10,
            (Tier::Free, FeatureType::Image) => 3,
            (Tier::Free, FeatureType::Video) => 1,
            (Tier::Free, FeatureType::Music) => 2,
            (Tier::Free, FeatureType::Ppt) => 0,
            (Tier::Free, FeatureType::Tts) => 5,

            (Tier::Starter, FeatureType::Message) => 100,
            (Tier::Starter, FeatureType::Image) => 30,
            (Tier::Starter, FeatureType::Video) => 5,
            (Tier::Starter, FeatureType::Music) => 10,
            (Tier::Starter, FeatureType::Ppt) => 5,
            (Tier::Starter, FeatureType::Tts) => 50,

            (Tier::Pro, FeatureType::Message) => 500,
            (Tier::Pro, FeatureType::Image) => 100,
            (Tier::Pro, FeatureType::Video) => 20,
            (Tier::Pro, FeatureType::Music) => 40,
            (Tier::Pro, FeatureType::Ppt) => 20,
            (Tier::Pro, FeatureType::Tts) => 200,

            (Tier::Premium, FeatureType::Message) => 2000,
            (Tier::Premium, FeatureType::Image) => 400,
            (Tier::Premium, FeatureType::Video) => 60,
            (Tier::Premium, FeatureType::Music) => 120,
            (Tier::Premium, FeatureType::Ppt) => 50,
            (Tier::Premium, FeatureType::Tts) => 500,
        }
    }
}

/// Result of a limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitDecision {
    /// The generation may proceed. Remaining/limit are returned for display.
    Allowed { remaining: u32, limit: u32 },
    /// The generation is denied with a specific reason.
    Denied(DenialReason),
}

impl LimitDecision {
    /// Returns true if the generation may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, LimitDecision::Allowed { .. })
    }
}

/// Reason why a limit check denied a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DenialReason {
    /// The tier's quota for this feature is zero.
    RequiresUpgrade { feature: FeatureType, tier: Tier },

    /// The period quota cannot cover the model's cost.
    QuotaExhausted {
        feature: FeatureType,
        remaining: u32,
        limit: u32,
        cost: u32,
    },
}

impl DenialReason {
    /// User-facing message for the denial.
    pub fn user_message(&self) -> String {
        match self {
            DenialReason::RequiresUpgrade { feature, tier } => {
                format!(
                    "{} generation is not included in the {} plan. Please upgrade to use it.",
                    feature,
                    tier.display_name()
                )
            }
            DenialReason::QuotaExhausted {
                feature,
                remaining,
                limit,
                ..
            } => {
                format!(
                    "You've used your {} quota for this period ({} of {} remaining). Upgrade or wait for the next reset.",
                    feature, remaining, limit
                )
            }
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}
