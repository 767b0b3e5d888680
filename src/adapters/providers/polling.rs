//! Shared poll-until-terminal loop.
//!
//! All providers expose the same shape: a status endpoint that eventually
//! reports success or failure. This loop polls it on a fixed interval,
//! reports progress to an optional callback, tolerates a bounded run of
//! consecutive transient errors, and gives up after a fixed attempt budget.

use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::foundation::TaskId;
use crate::domain::generation::{GenerationArtifact, TaskStatus};
use crate::ports::{GenerationProvider, ProviderError};

/// Tuning knobs for the polling loop.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Total status checks before giving up.
    pub max_attempts: u32,
    /// Pause between checks.
    pub interval: Duration,
    /// Consecutive transient errors tolerated before propagating.
    pub retry_budget: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(5),
            retry_budget: 3,
        }
    }
}

impl PollOptions {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            ..Self::default()
        }
    }

    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }
}

/// Synthetic progress when the provider reports none.
///
/// Climbs linearly with the attempt count but never claims more than 95%,
/// since only a terminal snapshot can say 100.
fn synthetic_progress(attempt: u32, max_attempts: u32) -> u8 {
    let pct = attempt.saturating_mul(90) / max_attempts.max(1);
    pct.min(95) as u8
}

/// Polls `provider` until `task_id` reaches a terminal state.
///
/// Non-terminal snapshots invoke `on_progress` with the provider-reported
/// percentage when there is one, or a synthetic estimate otherwise.
/// A run of transient errors longer than the retry budget propagates the
/// last error; exhausting `max_attempts` yields `ProviderError::Timeout`.
pub async fn poll_until_done(
    provider: &dyn GenerationProvider,
    task_id: &TaskId,
    options: &PollOptions,
    mut on_progress: Option<&mut (dyn FnMut(u8) + Send)>,
) -> Result<GenerationArtifact, ProviderError> {
    let mut consecutive_errors = 0u32;

    for attempt in 1..=options.max_attempts {
        match provider.check_status(task_id).await {
            Ok(snapshot) => {
                consecutive_errors = 0;
                match snapshot.status {
                    TaskStatus::Succeeded => {
                        let url = snapshot.result_url.ok_or_else(|| {
                            ProviderError::InvalidResponse(
                                "task succeeded without a result url".to_string(),
                            )
                        })?;
                        debug!(
                            provider = provider.name(),
                            task_id = %task_id,
                            attempts = attempt,
                            "generation task succeeded"
                        );
                        return Ok(GenerationArtifact {
                            task_id: task_id.clone(),
                            url,
                        });
                    }
                    TaskStatus::Failed => {
                        return Err(ProviderError::TaskFailed(
                            snapshot.error.unwrap_or_default(),
                        ));
                    }
                    TaskStatus::Pending | TaskStatus::Running => {
                        let pct = snapshot
                            .progress
                            .unwrap_or_else(|| synthetic_progress(attempt, options.max_attempts));
                        if let Some(cb) = on_progress.as_mut() {
                            cb(pct);
                        }
                    }
                }
            }
            Err(err) => {
                consecutive_errors += 1;
                if consecutive_errors > options.retry_budget {
                    return Err(err);
                }
                warn!(
                    provider = provider.name(),
                    task_id = %task_id,
                    error = %err,
                    consecutive_errors,
                    "transient error while polling, retrying"
                );
            }
        }

        if attempt < options.max_attempts {
            tokio::time::sleep(options.interval).await;
        }
    }

    Err(ProviderError::Timeout {
        attempts: options.max_attempts,
    })
}
