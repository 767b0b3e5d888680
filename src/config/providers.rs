//! Generation provider configuration

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::providers::PollOptions;

use super::error::ValidationError;

/// Settings shared by every provider adapter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSettings {
    /// API key for the provider.
    pub api_key: String,

    /// Override for the provider base URL.
    pub base_url: Option<String>,
}

impl ProviderSettings {
    fn validate(&self, key_name: &'static str) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired(key_name));
        }
        Ok(())
    }
}

/// Status polling settings, shared by all providers.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Total status checks before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between checks, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Consecutive transient errors tolerated before giving up.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
}

impl PollConfig {
    pub fn to_options(&self) -> PollOptions {
        PollOptions::new(self.max_attempts, Duration::from_millis(self.interval_ms))
            .with_retry_budget(self.retry_budget)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidPollAttempts);
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
            retry_budget: default_retry_budget(),
        }
    }
}

fn default_max_attempts() -> u32 {
    60
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_retry_budget() -> u32 {
    3
}

/// Configuration for all generation providers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    pub video: ProviderSettings,
    pub speech: ProviderSettings,
    pub music: ProviderSettings,
    pub slides: ProviderSettings,

    #[serde(default)]
    pub poll: PollConfig,
}

impl ProvidersConfig {
    /// Validate provider configuration. Missing API keys fail startup
    /// rather than surfacing as runtime auth errors.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.video.validate("PROVIDERS_VIDEO_API_KEY")?;
        self.speech.validate("PROVIDERS_SPEECH_API_KEY")?;
        self.music.validate("PROVIDERS_MUSIC_API_KEY")?;
        self.slides.validate("PROVIDERS_SLIDES_API_KEY")?;
        self.poll.validate()?;
        Ok(())
    }
}
