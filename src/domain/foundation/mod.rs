//! Foundation module - Shared domain primitives.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{TaskId, UserId};
pub use timestamp::Timestamp;
