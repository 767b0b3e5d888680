//! Billing webhook configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Billing integration configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Shared secret used to verify webhook signatures.
    pub webhook_secret: String,

    /// Days a lapsed paid tier keeps its benefits past period end.
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: i64,
}

impl BillingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("BILLING_WEBHOOK_SECRET"));
        }
        if self.grace_period_days < 0 {
            return Err(ValidationError::InvalidGracePeriod);
        }
        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            webhook_secret: String::new(),
            grace_period_days: default_grace_period_days(),
        }
    }
}

fn default_grace_period_days() -> i64 {
    3
}
