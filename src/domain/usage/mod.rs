//! Usage module - feature quotas, reset cadences, and consumption counters.

mod feature;
mod model_cost;
mod quota;
mod record;

pub use feature::{FeatureType, ResetCadence};
pub use model_cost::ModelCostTable;
pub use quota::{DenialReason, LimitDecision, QuotaTable};
pub use record::UsageData;
