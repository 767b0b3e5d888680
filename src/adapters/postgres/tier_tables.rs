//! Tier source adapters over the three backing tables.
//!
//! Priority order is decided by the resolver's wiring, not here:
//! `paid_tiers` first, then `free_tiers`, then the legacy `profiles` table
//! that only carries an `is_premium` flag and a token balance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::tier::{Tier, TierRow};
use crate::ports::{TierAdmin, TierSource, TierSourceError};

/// Reads the `paid_tiers` table: tier, balance, and period end.
pub struct PaidTiersSource {
    pool: PgPool,
}

impl PaidTiersSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TierSource for PaidTiersSource {
    fn name(&self) -> &str {
        "paid_tiers"
    }

    async fn lookup(&self, user_id: &UserId) -> Result<Option<TierRow>, TierSourceError> {
        let row = sqlx::query(
            "SELECT tier, token_balance, paid_until FROM paid_tiers WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tier: Option<String> = row.try_get("tier")?;
        let token_balance: Option<i64> = row.try_get("token_balance")?;
        let paid_until: Option<DateTime<Utc>> = row.try_get("paid_until")?;

        Ok(Some(TierRow {
            tier: tier.as_deref().and_then(Tier::parse),
            token_balance,
            is_premium: None,
            paid_until: paid_until.map(Timestamp::from_datetime),
        }))
    }
}

/// Reads the `free_tiers` table: explicit free-tier enrollments.
pub struct FreeTiersSource {
    pool: PgPool,
}

impl FreeTiersSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TierSource for FreeTiersSource {
    fn name(&self) -> &str {
        "free_tiers"
    }

    async fn lookup(&self, user_id: &UserId) -> Result<Option<TierRow>, TierSourceError> {
        let row = sqlx::query("SELECT tier FROM free_tiers WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tier: Option<String> = row.try_get("tier")?;

        Ok(Some(TierRow {
            tier: tier.as_deref().and_then(Tier::parse),
            ..Default::default()
        }))
    }
}

/// Reads the legacy `profiles` table: premium flag and token balance only.
pub struct ProfilesSource {
    pool: PgPool,
}

impl ProfilesSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TierSource for ProfilesSource {
    fn name(&self) -> &str {
        "profiles"
    }

    async fn lookup(&self, user_id: &UserId) -> Result<Option<TierRow>, TierSourceError> {
        let row = sqlx::query(
            "SELECT tier, is_premium, token_balance FROM profiles WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tier: Option<String> = row.try_get("tier")?;
        let is_premium: Option<bool> = row.try_get("is_premium")?;
        let token_balance: Option<i64> = row.try_get("token_balance")?;

        Ok(Some(TierRow {
            tier: tier.as_deref().and_then(Tier::parse),
            token_balance,
            is_premium,
            paid_until: None,
        }))
    }
}

/// Write side over `paid_tiers`, driven by billing webhooks.
pub struct PgTierAdmin {
    pool: PgPool,
}

impl PgTierAdmin {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TierAdmin for PgTierAdmin {
    async fn set_tier(
        &self,
        user_id: &UserId,
        tier: Tier,
        paid_until: Option<Timestamp>,
    ) -> Result<(), TierSourceError> {
        sqlx::query(
            "INSERT INTO paid_tiers (user_id, tier, paid_until) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET tier = $2, paid_until = $3",
        )
        .bind(user_id.as_str())
        .bind(tier.as_str())
        .bind(paid_until.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_tier(&self, user_id: &UserId) -> Result<(), TierSourceError> {
        // The row doubles as the token ledger's backing store, so only the
        // tier columns are cleared; token_balance survives cancellation.
        sqlx::query("UPDATE paid_tiers SET tier = NULL, paid_until = NULL WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
