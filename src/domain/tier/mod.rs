//! Tier module - subscription tiers and resolved user tier information.

mod info;
mod tier;

pub use info::{TierRow, UserTierInfo, DEFAULT_GRACE_PERIOD_DAYS};
pub use tier::Tier;
