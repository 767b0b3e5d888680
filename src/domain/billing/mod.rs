//! Billing module - webhook events from the payment backend.

mod errors;
mod event;
mod verifier;

pub use errors::WebhookError;
pub use event::{BillingEvent, BillingEventKind};
pub use verifier::{BillingWebhookVerifier, SignatureHeader};
