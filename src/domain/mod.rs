//! Domain layer containing business logic and domain types.

pub mod billing;
pub mod foundation;
pub mod generation;
pub mod tier;
pub mod usage;
