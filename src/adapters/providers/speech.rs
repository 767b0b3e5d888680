//! Text-to-speech provider adapter.
//!
//! Statuses on the wire: `pending | in_progress | done | error`. The service
//! never reports a percentage, so callers see synthetic progress only.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::TaskId;
use crate::domain::generation::TaskSnapshot;
use crate::domain::usage::FeatureType;
use crate::ports::{GenerationProvider, ProviderError, SubmitParams};

use super::http::check_http_status;

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    api_key: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
    /// Voice used when the request does not pick a model.
    pub default_voice: String,
}

impl SpeechConfig {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            base_url: "https://api.speechsynth.example.com".to_string(),
            timeout: Duration::from_secs(30),
            default_voice: "tts-standard".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_default_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = voice.into();
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

pub struct SpeechProvider {
    config: SpeechConfig,
    client: Client,
}

impl SpeechProvider {
    pub fn new(config: SpeechConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::from_reqwest)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl GenerationProvider for SpeechProvider {
    fn name(&self) -> &str {
        "speech"
    }

    fn feature(&self) -> FeatureType {
        FeatureType::Tts
    }

    async fn submit(&self, params: SubmitParams) -> Result<TaskId, ProviderError> {
        let body = SpeechSubmitRequest {
            text: params.prompt,
            voice: params
                .model
                .unwrap_or_else(|| self.config.default_voice.clone()),
        };

        let response = self
            .client
            .post(format!("{}/v1/synthesize", self.config.base_url))
            .header("x-api-key", self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let response = check_http_status(response).await?;
        let submitted: SpeechSubmitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        TaskId::new(submitted.id)
            .map_err(|e| ProviderError::InvalidResponse(format!("bad task id: {}", e)))
    }

    async fn check_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/synthesize/{}", self.config.base_url, task_id))
            .header("x-api-key", self.config.api_key())
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let response = check_http_status(response).await?;
        let status: SpeechStatusResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        map_status(status)
    }
}

fn map_status(resp: SpeechStatusResponse) -> Result<TaskSnapshot, ProviderError> {
    match resp.status.as_str() {
        "pending" => Ok(TaskSnapshot::pending()),
        "in_progress" => Ok(TaskSnapshot::running(None)),
        "done" => {
            let url = resp.audio_url.ok_or_else(|| {
                ProviderError::InvalidResponse("done job without audio_url".to_string())
            })?;
            Ok(TaskSnapshot::succeeded(url))
        }
        "error" => Ok(TaskSnapshot::failed(resp.message.unwrap_or_default())),
        other => Err(ProviderError::InvalidResponse(format!(
            "unknown speech status: {}",
            other
        ))),
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct SpeechSubmitRequest {
    text: String,
    voice: String,
}

#[derive(Debug, Deserialize)]
struct SpeechSubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpeechStatusResponse {
    status: String,
    #[serde(default)]
    audio_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}
