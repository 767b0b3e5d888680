//! Application layer - use-case services wired over the ports.

mod orchestrator;
mod tier_resolver;
mod usage_limiter;

pub use orchestrator::{GenerationOrchestrator, GenerationOutcome, GenerationRequest};
pub use tier_resolver::TierResolver;
pub use usage_limiter::{FeatureUsage, UsageLimiter};
