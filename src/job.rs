//! Job record and status model.
//!
//! A [`Job`] is the client-held record of one unit of backend analysis work.
//! It is created by [`crate::submit::JobSubmitter`] with status `STARTED`,
//! mutated only by the backend executor, and observed through
//! [`crate::track`] until a terminal status arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of analysis the backend runs over a submitted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Full document analysis: structure, entities, findings.
    Analyze,
    /// Field extraction into structured records.
    Extract,
    /// Narrative summary of the batch.
    Summarize,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Analyze => write!(f, "analyze"),
            TaskKind::Extract => write!(f, "extract"),
            TaskKind::Summarize => write!(f, "summarize"),
        }
    }
}

/// Backend-reported job status.
///
/// Status is monotonic: once `SUCCEEDED` or `FAILED` has been observed no
/// further transition is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Started,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// True for `SUCCEEDED` and `FAILED` — no further transitions are valid.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Client-held record of one backend analysis job.
///
/// Invariants maintained by the backend and observed here: `result_url` is
/// populated iff the status is `SUCCEEDED`; `error` is populated iff the
/// status is `FAILED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque backend-assigned identifier.
    pub id: String,
    pub task: TaskKind,
    pub status: JobStatus,
    /// Locator of the analysis result; present only when `SUCCEEDED`.
    #[serde(default)]
    pub result_url: Option<String>,
    /// Backend-reported failure detail; present only when `FAILED`.
    #[serde(default)]
    pub error: Option<String>,
    pub session_id: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Started.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn status_wire_format() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Started).unwrap(),
            r#""STARTED""#
        );
        let parsed: JobStatus = serde_json::from_str(r#""SUCCEEDED""#).unwrap();
        assert_eq!(parsed, JobStatus::Succeeded);
    }

    #[test]
    fn task_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskKind::Analyze).unwrap(),
            r#""analyze""#
        );
    }
}
