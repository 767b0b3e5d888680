//! GenerationProvider port - one external generation API.
//!
//! Every provider follows the same submit + poll-until-terminal pattern;
//! only the wire shapes and status vocabulary differ. There is no
//! cancellation: once submitted, a task runs to provider-side completion
//! whether or not anyone keeps polling.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::TaskId;
use crate::domain::generation::TaskSnapshot;
use crate::domain::usage::FeatureType;

/// Parameters for submitting a generation.
#[derive(Debug, Clone, Default)]
pub struct SubmitParams {
    /// The generation prompt.
    pub prompt: String,
    /// Provider model id, when the caller picked one.
    pub model: Option<String>,
    /// Provider-specific extras passed through untouched.
    pub extra: Option<Value>,
}

impl SubmitParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            extra: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Port for one external generation provider.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name used in logs ("video", "speech", ...).
    fn name(&self) -> &str;

    /// The feature this provider serves, for quota accounting.
    fn feature(&self) -> FeatureType;

    /// Submits a generation, returning the provider-assigned task id.
    async fn submit(&self, params: SubmitParams) -> Result<TaskId, ProviderError>;

    /// Fetches the current status of a task.
    async fn check_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ProviderError>;
}

/// Errors from provider adapters.
///
/// Display text matters: the orchestrator classifies failures by matching
/// substrings of these messages.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider API key is missing or rejected. Configuration error.
    #[error("provider api key missing or rejected: {0}")]
    ApiKey(String),

    /// Non-2xx response from the provider.
    #[error("provider returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Polling exhausted its attempt budget.
    #[error("generation timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// The provider reported the task as failed.
    #[error("{0}")]
    TaskFailed(String),

    /// The provider answered with something we cannot interpret.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Maps a reqwest transport error to the right variant.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Network(format!("request timeout: {}", err))
        } else if err.is_connect() {
            ProviderError::Network(format!("connection failed: {}", err))
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}
