//! Job states and status records.

use chrono::{DateTime, Utc};
use ir_common::JobId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle state of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Uploaded => "uploaded",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of one job as seen by status queries.
///
/// Readers always get a whole cloned record; partial updates are never
/// observable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: JobId,
    pub filename: String,
    pub state: JobState,
    /// 0..=100.
    pub progress: u8,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub result_files: Vec<PathBuf>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatus {
    pub fn new(job_id: JobId, filename: impl Into<String>) -> Self {
        JobStatus {
            job_id,
            filename: filename.into(),
            state: JobState::Uploaded,
            progress: 0,
            message: "uploaded".to_string(),
            submitted_at: Utc::now(),
            result_files: Vec::new(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serde_names() {
        assert_eq!(
            serde_json::to_string(&JobState::Processing).unwrap(),
            "\"processing\""
        );
        let state: JobState = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(state, JobState::Failed);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Uploaded.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }
}
