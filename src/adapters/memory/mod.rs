//! In-memory adapters.
//!
//! Mutex-backed implementations of the storage ports. Useful for
//! development, demos, and tests; nothing survives a restart. Production
//! deployments use the PostgreSQL adapters instead.

mod tier_directory;
mod token_ledger;
mod usage_store;

pub use tier_directory::InMemoryTierDirectory;
pub use token_ledger::InMemoryTokenLedger;
pub use usage_store::InMemoryUsageStore;
