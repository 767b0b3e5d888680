//! The single authoritative tier resolver.
//!
//! Walks an ordered list of tier sources and derives [`UserTierInfo`] from
//! the first row found. Resolution never raises: source errors are logged
//! and treated as "not found here", and when every source comes up empty
//! the user resolves to the default free state.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::tier::UserTierInfo;
use crate::ports::TierSource;

/// Resolves a user's tier, paid flag, and token balance.
pub struct TierResolver {
    sources: Vec<Arc<dyn TierSource>>,
    grace_period_days: i64,
}

impl TierResolver {
    /// Creates a resolver over the given sources, in priority order.
    pub fn new(sources: Vec<Arc<dyn TierSource>>, grace_period_days: i64) -> Self {
        Self {
            sources,
            grace_period_days,
        }
    }

    /// Resolves tier info for a user. Infallible by contract: lookup
    /// failures degrade to the free default.
    pub async fn resolve(&self, user_id: &UserId) -> UserTierInfo {
        let now = Timestamp::now();

        for source in &self.sources {
            match source.lookup(user_id).await {
                Ok(Some(row)) => {
                    debug!(
                        user_id = %user_id,
                        source = source.name(),
                        "tier resolved"
                    );
                    return UserTierInfo::from_row(
                        user_id.clone(),
                        &row,
                        now,
                        self.grace_period_days,
                    );
                }
                Ok(None) => {
                    debug!(
                        user_id = %user_id,
                        source = source.name(),
                        "no row in source, trying next"
                    );
                }
                Err(err) => {
                    warn!(
                        user_id = %user_id,
                        source = source.name(),
                        error = %err,
                        "tier source lookup failed, trying next"
                    );
                }
            }
        }

        debug!(user_id = %user_id, "no tier source matched, defaulting to free");
        UserTierInfo::unknown(user_id.clone())
    }
}
