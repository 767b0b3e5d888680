//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `TierSource` - one candidate source of tier data (read side)
//! - `TierAdmin` - tier mutations driven by billing webhooks (write side)
//! - `TokenLedger` - consumable token credit balance per user
//! - `UsageStore` - persisted per-user usage counters
//! - `GenerationProvider` - one external generation API (submit + status)

mod generation_provider;
mod tier_admin;
mod tier_source;
mod token_ledger;
mod usage_store;

pub use generation_provider::{GenerationProvider, ProviderError, SubmitParams};
pub use tier_admin::TierAdmin;
pub use tier_source::{TierSource, TierSourceError};
pub use token_ledger::{TokenLedger, TokenLedgerError};
pub use usage_store::{UsageStore, UsageStoreError};
