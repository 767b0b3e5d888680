//! Video generation provider adapter.
//!
//! Submit returns a job id; the status endpoint reports
//! `queued | processing | completed | failed` plus a percentage while
//! processing.

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

/// Configuration for the video provider.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    api_key: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl VideoConfig {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            base_url: "https://api.videogen.example.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

pub struct VideoProvider {
    config: VideoConfig,
    client: Client,
}

impl VideoProvider {
    pub fn new(config: VideoConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::from_reqwest)?;
        Ok(Self { config, client })
    }

    fn submit_url(&self) -> String {
        format!("{}/v1/videos", self.config.base_url)
    }

    fn status_url(&self, task_id: &TaskId) -> String {
        format!("{}/v1/videos/{}", self.config.base_url, task_id)
    }
}

#[async_trait]
impl GenerationProvider for VideoProvider {
    fn name(&self) -> &str {
        "video"
    }

    fn feature(&self) -> FeatureType {
        FeatureType::Video
    }

    async fn submit(&self, params: SubmitParams) -> Result<TaskId, ProviderError> {
        let body = VideoSubmitRequest {
            prompt: params.prompt,
            model: params.model,
            options: params.extra,
        };

        let response = self
            .client
            .post(self.submit_url())
            .bearer_auth(self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let response = check_http_status(response).await?;
        let submitted: VideoSubmitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        TaskId::new(submitted.job_id)
            .map_err(|e| ProviderError::InvalidResponse(format!("bad job id: {}", e)))
    }

    async fn check_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ProviderError> {
        let response = self
            .client
            .get(self.status_url(task_id))
            .bearer_auth(self.config.api_key())
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let response = check_http_status(response).await?;
        let status: VideoStatusResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        map_status(status)
    }
}

/// Collapses the wire status to the common tri-state.
fn map_status(resp: VideoStatusResponse) -> Result<TaskSnapshot, ProviderError> {
    match resp.status.as_str() {
        "queued" => Ok(TaskSnapshot::pending()),
        "processing" => Ok(TaskSnapshot::running(resp.percent)),
        "completed" => {
            let url = resp.video_url.ok_or_else(|| {
                ProviderError::InvalidResponse("completed job without video_url".to_string())
            })?;
            Ok(TaskSnapshot::succeeded(url))
        }
        "failed" => Ok(TaskSnapshot::failed(resp.error.unwrap_or_default())),
        other => Err(ProviderError::InvalidResponse(format!(
            "unknown video status: {}",
            other
        ))),
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct VideoSubmitRequest {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct VideoSubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct VideoStatusResponse {
    status: String,
    #[serde(default)]
    percent: Option<u8>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
