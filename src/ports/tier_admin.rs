//! TierAdmin port - tier mutations driven by billing webhooks.

use async_trait::async_trait;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::tier::Tier;

use super::tier_source::TierSourceError;

/// Port for writing tier state.
///
/// Only the webhook handler uses this; everything else reads through
/// `TierSource`.
#[async_trait]
pub trait TierAdmin: Send + Sync {
    /// Upserts the user's paid tier with a period end.
    async fn set_tier(
        &self,
        user_id: &UserId,
        tier: Tier,
        paid_until: Option<Timestamp>,
    ) -> Result<(), TierSourceError>;

    /// Clears the user's paid tier (downgrade to free).
    ///
    /// Token balances are untouched: purchased tokens survive cancellation.
    async fn clear_tier(&self, user_id: &UserId) -> Result<(), TierSourceError>;
}
