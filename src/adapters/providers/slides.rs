//! Slide deck generation provider adapter.
//!
//! Statuses on the wire: `created | generating | ready | failed`. The
//! generating state reports which slide the service is working on, which we
//! turn into a percentage when the total is known.

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
pub struct SlidesConfig {
    api_key: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl SlidesConfig {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            base_url: "https://api.decksmith.example.com".to_string(),
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

pub struct SlidesProvider {
    config: SlidesConfig,
    client: Client,
}

impl SlidesProvider {
    pub fn new(config: SlidesConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::from_reqwest)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl GenerationProvider for SlidesProvider {
    fn name(&self) -> &str {
        "slides"
    }

    fn feature(&self) -> FeatureType {
        FeatureType::Ppt
    }

    async fn submit(&self, params: SubmitParams) -> Result<TaskId, ProviderError> {
        let body = SlidesSubmitRequest {
            topic: params.prompt,
            template: params.model,
            settings: params.extra,
        };

        let response = self
            .client
            .post(format!("{}/v1/decks", self.config.base_url))
            .header("x-api-key", self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let response = check_http_status(response).await?;
        let submitted: SlidesSubmitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        TaskId::new(submitted.deck_id)
            .map_err(|e| ProviderError::InvalidResponse(format!("bad deck id: {}", e)))
    }

    async fn check_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/decks/{}", self.config.base_url, task_id))
            .header("x-api-key", self.config.api_key())
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let response = check_http_status(response).await?;
        let status: SlidesStatusResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        map_status(status)
    }
}

fn map_status(resp: SlidesStatusResponse) -> Result<TaskSnapshot, ProviderError> {
    match resp.status.as_str() {
        "created" => Ok(TaskSnapshot::pending()),
        "generating" => Ok(TaskSnapshot::running(slide_progress(&resp))),
        "ready" => {
            let url = resp.deck_url.ok_or_else(|| {
                ProviderError::InvalidResponse("ready deck without deck_url".to_string())
            })?;
            Ok(TaskSnapshot::succeeded(url))
        }
        "failed" => Ok(TaskSnapshot::failed(resp.error.unwrap_or_default())),
        other => Err(ProviderError::InvalidResponse(format!(
            "unknown slides status: {}",
            other
        ))),
    }
}

fn slide_progress(resp: &SlidesStatusResponse) -> Option<u8> {
    match (resp.current_slide, resp.total_slides) {
        (Some(current), Some(total)) if total > 0 => {
            Some(((current.min(total) as u32 * 100) / total as u32) as u8)
        }
        _ => None,
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct SlidesSubmitRequest {
    topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    settings: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SlidesSubmitResponse {
    deck_id: String,
}

#[derive(Debug, Deserialize)]
struct SlidesStatusResponse {
    status: String,
    #[serde(default)]
    current_slide: Option<u16>,
    #[serde(default)]
    total_slides: Option<u16>,
    #[serde(default)]
    deck_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
