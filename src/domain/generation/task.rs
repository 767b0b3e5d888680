//! In-flight generation task state.
//!
//! Providers each speak their own status vocabulary; everything collapses to
//! the tri-state here. Tasks are transient: created on submit, polled until
//! terminal, discarded after resolution.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TaskId, Timestamp};

/// Collapsed task status across all providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted by the provider, not started.
    Pending,
    /// The provider is working on it.
    Running,
    /// Finished with a result payload.
    Succeeded,
    /// Finished with an error.
    Failed,
}

impl TaskStatus {
    /// True if polling should stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

/// One status observation of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    /// Provider-reported completion percentage, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Result URL, present when succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    /// Error message, present when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskSnapshot {
    pub fn pending() -> Self {
        Self {
            status: TaskStatus::Pending,
            progress: None,
            result_url: None,
            error: None,
        }
    }

    pub fn running(progress: Option<u8>) -> Self {
        Self {
            status: TaskStatus::Running,
            progress,
            result_url: None,
            error: None,
        }
    }

    pub fn succeeded(result_url: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Succeeded,
            progress: Some(100),
            result_url: Some(result_url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            progress: None,
            result_url: None,
            error: Some(error.into()),
        }
    }
}

/// Transient record of one in-flight provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTask {
    pub task_id: TaskId,
    pub submitted_at: Timestamp,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
}

impl GenerationTask {
    /// A freshly submitted task.
    pub fn submitted(task_id: TaskId) -> Self {
        Self {
            task_id,
            submitted_at: Timestamp::now(),
            status: TaskStatus::Pending,
            result_url: None,
        }
    }
}

/// Successful generation output handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationArtifact {
    pub task_id: TaskId,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_and_running_are_not_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn succeeded_and_failed_are_terminal() {
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn succeeded_snapshot_carries_url_and_full_progress() {
        let snap = TaskSnapshot::succeeded("https://cdn.example.com/out.mp4");
        assert_eq!(snap.status, TaskStatus::Succeeded);
        assert_eq!(snap.progress, Some(100));
        assert_eq!(snap.result_url.as_deref(), Some("https://cdn.example.com/out.mp4"));
    }

    #[test]
    fn failed_snapshot_carries_error() {
        let snap = TaskSnapshot::failed("provider exploded");
        assert_eq!(snap.status, TaskStatus::Failed);
        assert_eq!(snap.error.as_deref(), Some("provider exploded"));
    }

    #[test]
    fn submitted_task_starts_pending() {
        let task = GenerationTask::submitted(TaskId::new("t-1").unwrap());
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.result_url.is_none());
    }

    #[test]
    fn snapshot_omits_absent_fields_in_json() {
        let json = serde_json::to_string(&TaskSnapshot::pending()).unwrap();
        assert!(!json.contains("result_url"));
        assert!(!json.contains("error"));
    }
}
