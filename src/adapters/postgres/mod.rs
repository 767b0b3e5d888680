//! PostgreSQL adapters.
//!
//! Production implementations of the storage ports over sqlx. Queries are
//! runtime-checked (no compile-time macros) so builds do not need a live
//! database. Schema lives in `migrations/`.

mod tier_tables;
mod token_ledger;
mod usage_store;

pub use tier_tables::{FreeTiersSource, PaidTiersSource, PgTierAdmin, ProfilesSource};
pub use token_ledger::PgTokenLedger;
pub use usage_store::PgUsageStore;
