//! User-facing classification of provider errors.
//!
//! Provider failures arrive as free-form text. Known shapes get a friendly
//! message; anything unrecognized is surfaced verbatim so support tickets
//! still carry the original detail.

/// Generic message used when the error text is empty.
const GENERIC_FAILURE: &str = "Generation failed. Please try again.";

/// Maps raw provider error text to a user-facing message.
pub fn classify_error(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return GENERIC_FAILURE.to_string();
    }

    let lower = text.to_ascii_lowercase();

    if lower.contains("api key")
        || lower.contains("unauthorized")
        || lower.contains("invalid key")
        || lower.contains("missing key")
    {
        return "The service is not configured correctly. Please contact support.".to_string();
    }

    if lower.contains("rate limit") || lower.contains("429") || lower.contains("too many requests")
    {
        return "Rate limit reached. Please wait a moment and try again.".to_string();
    }

    if lower.contains("timeout") || lower.contains("timed out") {
        return "The generation request timed out. Please try again.".to_string();
    }

    if lower.contains("network") || lower.contains("connection") {
        return "A network error occurred while contacting the provider. Please try again."
            .to_string();
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_text_mentions_rate_limit_reached() {
        let msg = classify_error("provider said: rate limit exceeded for key");
        assert!(msg.contains("Rate limit reached"));
    }

    #[test]
    fn http_429_maps_to_rate_limit() {
        let msg = classify_error("HTTP 429 from upstream");
        assert!(msg.contains("Rate limit reached"));
    }

    #[test]
    fn timeout_text_mentions_timed_out() {
        let msg = classify_error("request timeout after 120s");
        assert!(msg.contains("timed out"));
    }

    #[test]
    fn api_key_errors_say_contact_support() {
        let msg = classify_error("Invalid API key provided");
        assert!(msg.contains("contact support"));
    }

    #[test]
    fn unauthorized_maps_to_contact_support() {
        let msg = classify_error("401 Unauthorized");
        assert!(msg.contains("contact support"));
    }

    #[test]
    fn network_errors_get_network_message() {
        let msg = classify_error("connection refused by host");
        assert!(msg.contains("network error"));
    }

    #[test]
    fn unknown_errors_surface_verbatim() {
        let msg = classify_error("the moon is in the wrong phase");
        assert_eq!(msg, "the moon is in the wrong phase");
    }

    #[test]
    fn empty_text_gets_generic_message() {
        assert_eq!(classify_error(""), GENERIC_FAILURE);
        assert_eq!(classify_error("   "), GENERIC_FAILURE);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert!(classify_error("RATE LIMIT").contains("Rate limit reached"));
        assert!(classify_error("TIMEOUT").contains("timed out"));
    }
}
