//! Resolved tier information for a user.
//!
//! `UserTierInfo` is the single shape the rest of the system consumes for
//! "what can this user do". It is derived from whichever backing source
//! answered first, with a grace window applied to lapsed paid rows.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::Tier;

/// Days of continued paid access after a paid row's expiry lapses.
pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 3;

/// Raw row returned by a tier source.
///
/// Sources differ in which columns they carry; everything is optional and
/// derivation happens in [`UserTierInfo::from_row`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierRow {
    /// Stored tier value, if the source has one.
    pub tier: Option<Tier>,
    /// Consumable token credit balance.
    pub token_balance: Option<i64>,
    /// Explicit premium flag (legacy profiles table).
    pub is_premium: Option<bool>,
    /// When the paid period ends, if the source tracks expiry.
    pub paid_until: Option<Timestamp>,
}

/// Resolved subscription state for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTierInfo {
    pub user_id: UserId,
    pub tier: Tier,
    pub is_paid: bool,
    /// Token balance, clamped to zero. Free users carry no balance.
    pub token_balance: u64,
}

impl UserTierInfo {
    /// The default result when no source knows the user or every lookup
    /// failed. Resolution never raises; it degrades to this.
    pub fn unknown(user_id: UserId) -> Self {
        Self {
            user_id,
            tier: Tier::Free,
            is_paid: false,
            token_balance: 0,
        }
    }

    /// Derives tier info from a source row.
    ///
    /// Derivation rules, in order:
    /// 1. tier comes from the stored tier value, else an explicit premium
    ///    flag promotes to Premium, else Free;
    /// 2. a lapsed paid row (past `paid_until` plus the grace window) is
    ///    downgraded to Free and loses paid status;
    /// 3. `is_paid` holds if the effective tier is paid, the premium flag is
    ///    set, or a positive token balance exists.
    pub fn from_row(
        user_id: UserId,
        row: &TierRow,
        now: Timestamp,
        grace_period_days: i64,
    ) -> Self {
        let stored_tier = row.tier.or(if row.is_premium == Some(true) {
            Some(Tier::Premium)
        } else {
            None
        });

        let mut tier = stored_tier.unwrap_or(Tier::Free);

        if tier.is_paid() {
            if let Some(paid_until) = row.paid_until {
                let hard_cutoff = paid_until.add_days(grace_period_days);
                if now.is_after(&hard_cutoff) {
                    tier = Tier::Free;
                }
            }
        }

        let token_balance = row.token_balance.unwrap_or(0).max(0) as u64;
        let is_paid = tier.is_paid() || row.is_premium == Some(true) || token_balance > 0;

        Self {
            user_id,
            tier,
            is_paid,
            token_balance,
        }
    }
}
