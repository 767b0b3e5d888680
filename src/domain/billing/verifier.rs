//! Billing webhook signature verification.
//!
//! HMAC-SHA256 over `{timestamp}.{payload}` with a shared secret, plus a
//! timestamp window to prevent replay. Comparison is constant-time.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::event::BillingEvent;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the signature header.
///
/// Format: `t=<unix seconds>,v1=<hex hmac>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// HMAC-SHA256 signature bytes.
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a signature header string.
    ///
    /// Unknown key/value pairs are ignored for forward compatibility.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        let v1_signature = v1_signature
            .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?;

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
        })
    }
}

/// Verifier for billing webhook signatures.
pub struct BillingWebhookVerifier {
    secret: Secret<String>,
}

impl BillingWebhookVerifier {
    /// Creates a new verifier with the given shared secret.
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// Verifies the webhook signature and parses the event.
    ///
    /// Steps: parse the header, validate the timestamp window, compute the
    /// expected HMAC, compare in constant time, then parse the JSON body.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<BillingEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected = self.compute_signature(header.timestamp, payload);
        if !constant_time_compare(&expected, &header.v1_signature) {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    /// Validates that the timestamp is within acceptable bounds.
    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }
        Ok(())
    }

    /// Computes the HMAC-SHA256 signature for the timestamp and payload.
    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time comparison of two byte slices.
///
/// Prevents timing attacks that could leak the expected signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn verifier() -> BillingWebhookVerifier {
        BillingWebhookVerifier::new(Secret::new(SECRET.to_string()))
    }

    fn sign(timestamp: i64, payload: &[u8]) -> String {
        let signed = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn event_payload() -> Vec<u8> {
        br#"{
            "id": "evt_1",
            "created": 1700000000,
            "type": "tokens.granted",
            "data": { "user_id": "u-1", "amount": 500 }
        }"#
        .to_vec()
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = event_payload();
        let ts = chrono::Utc::now().timestamp();
        let header = format!("t={},v1={}", ts, sign(ts, &payload));

        let event = verifier().verify_and_parse(&payload, &header).unwrap();
        assert_eq!(event.id, "evt_1");
    }

    #[test]
    fn rejects_tampered_payload() {
        let payload = event_payload();
        let ts = chrono::Utc::now().timestamp();
        let header = format!("t={},v1={}", ts, sign(ts, &payload));

        let mut tampered = payload.clone();
        let idx = tampered.len() - 2;
        tampered[idx] = b'0';
        let err = verifier().verify_and_parse(&tampered, &header).unwrap_err();
        assert_eq!(err, WebhookError::InvalidSignature);
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = event_payload();
        let ts = chrono::Utc::now().timestamp();
        let signed = format!("{}.{}", ts, String::from_utf8_lossy(&payload));
        let mut mac = Hmac::<Sha256>::new_from_slice(b"other_secret").unwrap();
        mac.update(signed.as_bytes());
        let header = format!("t={},v1={}", ts, hex::encode(mac.finalize().into_bytes()));

        let err = verifier().verify_and_parse(&payload, &header).unwrap_err();
        assert_eq!(err, WebhookError::InvalidSignature);
    }

    #[test]
    fn rejects_stale_timestamp() {
        let payload = event_payload();
        let ts = chrono::Utc::now().timestamp() - 3600;
        let header = format!("t={},v1={}", ts, sign(ts, &payload));

        let err = verifier().verify_and_parse(&payload, &header).unwrap_err();
        assert_eq!(err, WebhookError::TimestampOutOfRange);
    }

    #[test]
    fn rejects_future_timestamp() {
        let payload = event_payload();
        let ts = chrono::Utc::now().timestamp() + 3600;
        let header = format!("t={},v1={}", ts, sign(ts, &payload));

        let err = verifier().verify_and_parse(&payload, &header).unwrap_err();
        assert_eq!(err, WebhookError::InvalidTimestamp);
    }

    #[test]
    fn rejects_malformed_header() {
        let err = SignatureHeader::parse("not a header").unwrap_err();
        assert!(matches!(err, WebhookError::ParseError(_)));
    }

    #[test]
    fn header_parse_requires_both_fields() {
        assert!(SignatureHeader::parse("t=123").is_err());
        assert!(SignatureHeader::parse("v1=abcd").is_err());
    }

    #[test]
    fn header_parse_ignores_unknown_fields() {
        let ts = 1_700_000_000;
        let header = format!("t={},v1=aabb,v0=ccdd", ts);
        let parsed = SignatureHeader::parse(&header).unwrap();
        assert_eq!(parsed.timestamp, ts);
        assert_eq!(parsed.v1_signature, vec![0xaa, 0xbb]);
    }
}
