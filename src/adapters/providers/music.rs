//! Music generation provider adapter.
//!
//! Statuses on the wire: `submitted | running | complete | failed`, with an
//! optional 0.0–1.0 fraction while running.

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
pub struct MusicConfig {
    api_key: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl MusicConfig {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            base_url: "https://api.trackforge.example.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

pub struct MusicProvider {
    config: MusicConfig,
    client: Client,
}

impl MusicProvider {
    pub fn new(config: MusicConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::from_reqwest)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl GenerationProvider for MusicProvider {
    fn name(&self) -> &str {
        "music"
    }

    fn feature(&self) -> FeatureType {
        FeatureType::Music
    }

    async fn submit(&self, params: SubmitParams) -> Result<TaskId, ProviderError> {
        let body = MusicSubmitRequest {
            prompt: params.prompt,
            model: params.model,
        };

        let response = self
            .client
            .post(format!("{}/v1/tracks", self.config.base_url))
            .bearer_auth(self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let response = check_http_status(response).await?;
        let submitted: MusicSubmitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        TaskId::new(submitted.track_id)
            .map_err(|e| ProviderError::InvalidResponse(format!("bad track id: {}", e)))
    }

    async fn check_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/tracks/{}", self.config.base_url, task_id))
            .bearer_auth(self.config.api_key())
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let response = check_http_status(response).await?;
        let status: MusicStatusResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        map_status(status)
    }
}

fn map_status(resp: MusicStatusResponse) -> Result<TaskSnapshot, ProviderError> {
    match resp.status.as_str() {
        "submitted" => Ok(TaskSnapshot::pending()),
        "running" => {
            let progress = resp
                .fraction_complete
                .map(|f| (f.clamp(0.0, 1.0) * 100.0) as u8);
            Ok(TaskSnapshot::running(progress))
        }
        "complete" => {
            let url = resp.track_url.ok_or_else(|| {
                ProviderError::InvalidResponse("complete track without track_url".to_string())
            })?;
            Ok(TaskSnapshot::succeeded(url))
        }
        "failed" => Ok(TaskSnapshot::failed(resp.failure_reason.unwrap_or_default())),
        other => Err(ProviderError::InvalidResponse(format!(
            "unknown music status: {}",
            other
        ))),
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct MusicSubmitRequest {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MusicSubmitResponse {
    track_id: String,
}

#[derive(Debug, Deserialize)]
struct MusicStatusResponse {
    status: String,
    #[serde(default)]
    fraction_complete: Option<f32>,
    #[serde(default)]
    track_url: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
}
