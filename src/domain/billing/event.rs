//! Billing webhook event payloads.
//!
//! The payment backend posts signed JSON events when subscription state
//! changes. Unknown event types parse to `Unknown` and are acknowledged
//! without side effects, so the sender does not retry forever.

use serde::{Deserialize, Serialize};

use crate::domain::tier::Tier;

/// One webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingEvent {
    /// Sender-assigned event id.
    pub id: String,
    /// Unix seconds when the sender created the event.
    pub created: i64,
    #[serde(flatten)]
    pub kind: BillingEventKind,
}

/// Typed event variants, discriminated by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BillingEventKind {
    /// A checkout completed; the user moves to a paid tier.
    #[serde(rename = "checkout.completed")]
    CheckoutCompleted {
        user_id: String,
        tier: Tier,
        /// Unix seconds when the new paid period ends.
        current_period_end: i64,
    },

    /// An existing subscription changed tier or renewed.
    #[serde(rename = "subscription.updated")]
    SubscriptionUpdated {
        user_id: String,
        tier: Tier,
        current_period_end: i64,
    },

    /// The subscription was canceled; the user downgrades after any grace.
    #[serde(rename = "subscription.canceled")]
    SubscriptionCanceled { user_id: String },

    /// A token pack purchase or promotional grant.
    #[serde(rename = "tokens.granted")]
    TokensGranted { user_id: String, amount: i64 },

    /// Anything this version does not understand.
    #[serde(other)]
    Unknown,
}

impl BillingEventKind {
    /// Short name used in logs and acknowledgement responses.
    pub fn name(&self) -> &'static str {
        match self {
            BillingEventKind::CheckoutCompleted { .. } => "checkout.completed",
            BillingEventKind::SubscriptionUpdated { .. } => "subscription.updated",
            BillingEventKind::SubscriptionCanceled { .. } => "subscription.canceled",
            BillingEventKind::TokensGranted { .. } => "tokens.granted",
            BillingEventKind::Unknown => "unknown",
        }
    }
}
