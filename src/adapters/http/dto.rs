//! Wire DTOs for the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::FeatureUsage;
use crate::domain::tier::Tier;
use crate::domain::usage::FeatureType;

/// Which provider a generation request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Video,
    Speech,
    Music,
    Slides,
}

impl ProviderKind {
    /// The quota feature this provider consumes.
    pub fn feature(&self) -> FeatureType {
        match self {
            ProviderKind::Video => FeatureType::Video,
            ProviderKind::Speech => FeatureType::Tts,
            ProviderKind::Music => FeatureType::Music,
            ProviderKind::Slides => FeatureType::Ppt,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Video => "video",
            ProviderKind::Speech => "speech",
            ProviderKind::Music => "music",
            ProviderKind::Slides => "slides",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/generation`, discriminated by `action`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GenerationRequestBody {
    /// Submit a generation and wait for the result.
    Generate {
        provider: ProviderKind,
        prompt: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        extra: Option<Value>,
    },
    /// Check an in-flight task without consuming quota.
    Status {
        provider: ProviderKind,
        task_id: String,
    },
}

/// Error body returned by all endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Response of `GET /api/tier`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierResponse {
    pub user_id: String,
    pub tier: Tier,
    pub is_paid: bool,
    pub token_balance: u64,
}

/// Response of `GET /api/usage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageOverviewResponse {
    pub user_id: String,
    pub tier: Tier,
    pub features: Vec<FeatureUsage>,
}

/// Acknowledgement body for accepted webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub event: String,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
