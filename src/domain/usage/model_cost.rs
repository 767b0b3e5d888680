//! Model cost multipliers.
//!
//! Expensive models consume more of the period quota (and more tokens) per
//! call. Unknown models cost 1.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::FeatureType;

/// Known model cost factors. Keep in sync with the pricing page.
static MODEL_COSTS: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("video-standard", 1),
        ("video-turbo", 2),
        ("video-pro", 4),
        ("music-standard", 1),
        ("music-hd", 2),
        ("slides-standard", 1),
        ("slides-rich", 2),
        ("tts-standard", 1),
        ("tts-neural", 2),
        ("image-standard", 1),
        ("image-xl", 3),
    ])
});

/// Lookup table mapping model ids to quota cost factors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelCostTable;

impl ModelCostTable {
    pub fn new() -> Self {
        Self
    }

    /// Cost factor for a model. Unknown or absent models cost 1; the factor
    /// is always at least 1.
    pub fn cost_for(&self, model: Option<&str>) -> u32 {
        model
            .and_then(|m| MODEL_COSTS.get(m).copied())
            .unwrap_or(1)
            .max(1)
    }

    /// Token price of one generation: the feature's base token cost times
    /// the model factor. Used for paid-tier balance checks and deductions.
    pub fn token_cost(&self, feature: FeatureType, model: Option<&str>) -> u64 {
        u64::from(feature.base_token_cost()) * u64::from(self.cost_for(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_have_their_factor() {
        let table = ModelCostTable::new();
        assert_eq!(table.cost_for(Some("video-pro")), 4);
        assert_eq!(table.cost_for(Some("music-hd")), 2);
    }

    #[test]
    fn unknown_model_costs_one() {
        let table = ModelCostTable::new();
        assert_eq!(table.cost_for(Some("does-not-exist")), 1);
    }

    #[test]
    fn absent_model_costs_one() {
        let table = ModelCostTable::new();
        assert_eq!(table.cost_for(None), 1);
    }

    #[test]
    fn token_cost_multiplies_base_by_factor() {
        let table = ModelCostTable::new();
        // video base is 50, video-pro factor is 4
        assert_eq!(table.token_cost(FeatureType::Video, Some("video-pro")), 200);
        assert_eq!(table.token_cost(FeatureType::Video, None), 50);
    }
}
