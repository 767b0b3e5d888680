//! Generation orchestrator.
//!
//! Wraps an arbitrary async generation call with pre-flight limit and
//! balance checks and post-hoc usage accounting. The steps are strictly
//! ordered and each can short-circuit; once the provider has produced an
//! artifact, accounting failures are logged but never turn the result into
//! a failure, because the artifact already exists and belongs to the user.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::foundation::UserId;
use crate::domain::generation::classify_error;
use crate::domain::usage::{FeatureType, LimitDecision, ModelCostTable};
use crate::ports::{ProviderError, TokenLedger};

use super::tier_resolver::TierResolver;
use super::usage_limiter::UsageLimiter;

/// One generation request entering the pipeline.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub user_id: UserId,
    pub feature: FeatureType,
    pub model: Option<String>,
}

/// Outcome of an orchestrated generation.
///
/// Quota and balance denials are modeled as values, not errors, so callers
/// can branch on them when shaping responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum GenerationOutcome<T> {
    /// The artifact was produced.
    Completed { data: T },
    /// The quota check denied the request; the provider was never called.
    LimitReached { message: String },
    /// Paid tier with too few tokens; the provider was never called.
    InsufficientTokens { message: String },
    /// The provider call failed.
    Failed { message: String },
}

impl<T> GenerationOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Completed { .. })
    }

    pub fn limit_reached(&self) -> bool {
        matches!(self, GenerationOutcome::LimitReached { .. })
    }

    pub fn insufficient_tokens(&self) -> bool {
        matches!(self, GenerationOutcome::InsufficientTokens { .. })
    }
}

/// Orchestrates limit checks, the provider call, and usage accounting.
pub struct GenerationOrchestrator {
    resolver: Arc<TierResolver>,
    limiter: Arc<UsageLimiter>,
    ledger: Arc<dyn TokenLedger>,
    costs: ModelCostTable,
}

impl GenerationOrchestrator {
    pub fn new(
        resolver: Arc<TierResolver>,
        limiter: Arc<UsageLimiter>,
        ledger: Arc<dyn TokenLedger>,
    ) -> Self {
        Self {
            resolver,
            limiter,
            ledger,
            costs: ModelCostTable::new(),
        }
    }

    /// Runs one generation through the pipeline.
    ///
    /// 1. quota check - denial short-circuits without invoking the provider;
    /// 2. tier/balance check - paid users need tokens to cover the model;
    /// 3. the provider call itself;
    /// 4. post-success token deduction and usage recording (best-effort);
    /// 5. the artifact.
    pub async fn execute<T, F, Fut>(
        &self,
        request: GenerationRequest,
        generation_fn: F,
    ) -> GenerationOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let model = request.model.as_deref();

        // Step 1+2 preamble: both checks need the resolved tier.
        let tier_info = self.resolver.resolve(&request.user_id).await;

        // Step 1: quota check.
        let decision = match self
            .limiter
            .check(&request.user_id, tier_info.tier, request.feature, model)
            .await
        {
            Ok(decision) => decision,
            Err(err) => {
                warn!(
                    user_id = %request.user_id,
                    error = %err,
                    "usage store unavailable during limit check"
                );
                return GenerationOutcome::Failed {
                    message: classify_error(&err.to_string()),
                };
            }
        };

        if let LimitDecision::Denied(reason) = decision {
            return GenerationOutcome::LimitReached {
                message: reason.user_message(),
            };
        }

        // Step 2: token balance for paid tiers. The ledger is the authority
        // here; tier rows may carry a stale balance snapshot.
        let required_tokens = self.costs.token_cost(request.feature, model);
        if tier_info.tier.is_paid() {
            let balance = match self.ledger.balance(&request.user_id).await {
                Ok(balance) => balance,
                Err(err) => {
                    warn!(
                        user_id = %request.user_id,
                        error = %err,
                        "token ledger unavailable during balance check"
                    );
                    return GenerationOutcome::Failed {
                        message: classify_error(&err.to_string()),
                    };
                }
            };
            if balance < required_tokens {
                return GenerationOutcome::InsufficientTokens {
                    message: format!(
                        "This generation needs {} tokens but your balance is {}. Please top up.",
                        required_tokens, balance
                    ),
                };
            }
        }

        // Step 3: the provider call.
        let data = match generation_fn().await {
            Ok(data) => data,
            Err(err) => {
                info!(
                    user_id = %request.user_id,
                    feature = %request.feature,
                    error = %err,
                    "generation failed"
                );
                return GenerationOutcome::Failed {
                    message: classify_error(&err.to_string()),
                };
            }
        };

        // Step 4: accounting. The artifact exists; never fail the result
        // from here on.
        if tier_info.tier.is_paid() {
            if let Err(err) = self.ledger.deduct(&request.user_id, required_tokens).await {
                warn!(
                    user_id = %request.user_id,
                    amount = required_tokens,
                    error = %err,
                    "token deduction failed after successful generation"
                );
            }
        }

        if let Err(err) = self
            .limiter
            .record(&request.user_id, tier_info.tier, request.feature, model)
            .await
        {
            warn!(
                user_id = %request.user_id,
                feature = %request.feature,
                error = %err,
                "usage recording failed after successful generation"
            );
        }

        GenerationOutcome::Completed { data }
    }
}
