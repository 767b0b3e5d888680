//! Shared HTTP plumbing for the provider adapters.

use crate::ports::ProviderError;

/// Passes successful responses through; maps everything else to a
/// `ProviderError` with the response body as the message.
pub(super) async fn check_http_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(error_for_status(status.as_u16(), message))
}

/// Auth failures become `ApiKey` (surfaced as "contact support"); every
/// other non-2xx keeps its status code.
fn error_for_status(code: u16, message: String) -> ProviderError {
    match code {
        401 | 403 => ProviderError::ApiKey(message),
        code => ProviderError::Http {
            status: code,
            message,
        },
    }
}
