//! Feature types and their quota reset cadences.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::tier::Tier;

/// A gated product feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Message,
    Image,
    Video,
    Ppt,
    Music,
    Tts,
}

impl FeatureType {
    /// All feature types, for overview queries.
    pub const ALL: [FeatureType; 6] = [
        FeatureType::Message,
        FeatureType::Image,
        FeatureType::Video,
        FeatureType::Ppt,
        FeatureType::Music,
        FeatureType::Tts,
    ];

    /// Reset cadence for this feature at the given tier.
    ///
    /// Heavy features (video, music, slides) on the free tier use lifetime
    /// totals instead of a rolling window: a free user gets a fixed number
    /// of tries, ever.
    pub fn cadence(&self, tier: Tier) -> ResetCadence {
        if tier == Tier::Free
            && matches!(self, FeatureType::Video | FeatureType::Music | FeatureType::Ppt)
        {
            return ResetCadence::Lifetime;
        }
        match self {
            FeatureType::Message | FeatureType::Image | FeatureType::Tts => ResetCadence::Daily,
            FeatureType::Video | FeatureType::Music => ResetCadence::Weekly,
            FeatureType::Ppt => ResetCadence::Monthly,
        }
    }

    /// Base token price of one generation of this feature.
    ///
    /// Multiplied by the model cost factor to get the token deduction for
    /// paid users.
    pub fn base_token_cost(&self) -> u32 {
        match self {
            FeatureType::Message => 1,
            FeatureType::Image => 5,
            FeatureType::Tts => 10,
            FeatureType::Ppt => 20,
            FeatureType::Music => 25,
            FeatureType::Video => 50,
        }
    }

    /// Canonical lowercase name, matching the wire and storage format.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Message => "message",
            FeatureType::Image => "image",
            FeatureType::Video => "video",
            FeatureType::Ppt => "ppt",
            FeatureType::Music => "music",
            FeatureType::Tts => "tts",
        }
    }
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How often a feature's usage counter resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetCadence {
    /// Resets when the UTC calendar day changes.
    Daily,
    /// Resets once at least 7 days have elapsed since the last reset.
    Weekly,
    /// Resets once at least 30 days have elapsed since the last reset.
    Monthly,
    /// Never resets.
    Lifetime,
}

impl ResetCadence {
    /// True if a counter last reset at `last_reset` is due for a reset at `now`.
    pub fn is_due(&self, last_reset: &Timestamp, now: &Timestamp) -> bool {
        match self {
            ResetCadence::Daily => !last_reset.same_calendar_day(now),
            ResetCadence::Weekly => now.duration_since(last_reset).num_days() >= 7,
            ResetCadence::Monthly => now.duration_since(last_reset).num_days() >= 30,
            ResetCadence::Lifetime => false,
        }
    }
}
