//! Transcode Module
//!
//! Local model of a remote transcode pipeline run: the job record, the
//! workflow engine client, and the polling monitor that translates remote
//! execution state into local job progress.

mod monitor;
mod workflow;

pub use monitor::{MonitorConfig, TranscodeMonitor};
pub use workflow::{
    ExecutionRef, ExecutionState, ExecutionStatus, HttpWorkflowClient, MockWorkflowClient,
    WorkflowClient,
};

use serde::{Deserialize, Serialize};

use crate::core::{ExecutionId, JobId};

// =============================================================================
// Job Status
// =============================================================================

/// Local transcode job status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    /// Created, not yet submitted to the workflow engine
    #[default]
    Pending,
    /// Submitted; remote execution is being polled
    Running,
    /// Remote execution succeeded (terminal)
    Completed,
    /// Submission or remote execution failed (terminal)
    Failed,
}

impl JobStatus {
    /// Terminal statuses admit no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

// =============================================================================
// Transcode Job
// =============================================================================

/// One transcode pipeline run as seen by the editor
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeJob {
    /// Unique job ID (ULID)
    pub id: JobId,
    /// User-visible label
    pub label: String,
    /// Monotonically increasing progress estimate, 0-100; reaches exactly
    /// 100 only on completion
    pub progress: u8,
    /// Current status
    pub status: JobStatus,
    /// Remote execution identifier, present once submission succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_execution_id: Option<ExecutionId>,
    /// Failure detail for terminal-failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Terminal timestamp (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl TranscodeJob {
    /// Creates a new pending job
    pub fn new(label: &str) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            label: label.to_string(),
            progress: 0,
            status: JobStatus::Pending,
            workflow_execution_id: None,
            error: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
        }
    }

    /// Checks if the job reached a terminal status
    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }

    pub(crate) fn mark_running(&mut self, execution_id: &str) {
        self.status = JobStatus::Running;
        self.workflow_execution_id = Some(execution_id.to_string());
        self.progress = self.progress.max(5);
    }

    /// Advances the progress estimate; capped below 100 so only completion
    /// reaches it
    pub(crate) fn advance_progress(&mut self) {
        self.progress = (self.progress + 10).min(95);
    }

    pub(crate) fn mark_completed(&mut self) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.completed_at = Some(chrono::Utc::now().to_rfc3339());
    }

    pub(crate) fn mark_failed(&mut self, error: &str) {
        self.status = JobStatus::Failed;
        self.error = Some(error.to_string());
        self.completed_at = Some(chrono::Utc::now().to_rfc3339());
    }
}
