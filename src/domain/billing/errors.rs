//! Webhook processing errors.

use thiserror::Error;

/// Errors raised while verifying or parsing a billing webhook.
///
/// All of these map to a 400 response with no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signature did not match the payload.
    #[error("webhook signature verification failed")]
    InvalidSignature,

    /// Event is older than the replay window.
    #[error("webhook timestamp outside acceptable range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock-skew tolerance.
    #[error("webhook timestamp is invalid")]
    InvalidTimestamp,

    /// Header or payload could not be parsed.
    #[error("webhook parse error: {0}")]
    ParseError(String),
}
