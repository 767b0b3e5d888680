//! Generation module - in-flight task state and error surfacing.

mod classify;
mod task;

pub use classify::classify_error;
pub use task::{GenerationArtifact, GenerationTask, TaskSnapshot, TaskStatus};
