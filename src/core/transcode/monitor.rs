//! Transcode Job Monitor
//!
//! Submits a transcode request to the workflow engine and polls the remote
//! execution until a terminal state is observed, translating remote state
//! into the local job-progress model.
//!
//! Only one active job is permitted per monitor; a submission attempt while
//! one is running is a no-op returning the running job's ID. Submission
//! errors propagate to the caller; polling-stage errors terminal-fail the
//! job locally instead.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{ExecutionState, JobStatus, TranscodeJob, WorkflowClient};
use crate::core::{CoreError, CoreResult, JobId};

// =============================================================================
// Configuration
// =============================================================================

/// Polling configuration for the transcode monitor
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Workflow name the executions are created under
    pub workflow: String,
    /// Delay before the first status check
    pub initial_delay: Duration,
    /// Fixed interval between subsequent checks
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            workflow: "media-transcode".to_string(),
            initial_delay: Duration::from_secs(2),
            poll_interval: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Monitor
// =============================================================================

/// Drives one transcode job at a time against the workflow engine
pub struct TranscodeMonitor {
    client: Arc<dyn WorkflowClient>,
    config: MonitorConfig,
    active: Mutex<Option<TranscodeJob>>,
}

impl TranscodeMonitor {
    pub fn new(client: Arc<dyn WorkflowClient>, config: MonitorConfig) -> Self {
        Self {
            client,
            config,
            active: Mutex::new(None),
        }
    }

    /// Snapshot of the current job, if any
    pub fn current_job(&self) -> Option<TranscodeJob> {
        self.active.lock().unwrap().clone()
    }

    /// Submits a new transcode execution.
    ///
    /// Returns the running job's ID without submitting when a non-terminal
    /// job already exists. A rejected submission marks the job failed and
    /// propagates the error.
    pub async fn submit(&self, label: &str, args: serde_json::Value) -> CoreResult<JobId> {
        let job_id = {
            let mut active = self.active.lock().unwrap();
            if let Some(job) = active.as_ref() {
                if !job.is_done() {
                    debug!("transcode already in flight ({}), ignoring submit", job.id);
                    return Ok(job.id.clone());
                }
            }
            let job = TranscodeJob::new(label);
            let id = job.id.clone();
            *active = Some(job);
            id
        };

        match self
            .client
            .create_execution(&self.config.workflow, args)
            .await
        {
            Ok(exec) => {
                let execution_id = exec.execution_id().to_string();
                info!("transcode {} submitted as execution {}", job_id, execution_id);
                if let Some(job) = self.active.lock().unwrap().as_mut() {
                    job.mark_running(&execution_id);
                }
                Ok(job_id)
            }
            Err(e) => {
                warn!("transcode {} submission failed: {}", job_id, e);
                if let Some(job) = self.active.lock().unwrap().as_mut() {
                    job.mark_failed(&e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Polls the running execution until it reaches a terminal state and
    /// returns the final job.
    ///
    /// The first check happens after the configured initial delay,
    /// subsequent ones on the fixed interval. An execution that never leaves
    /// `ACTIVE` is polled indefinitely.
    pub async fn run_to_completion(&self) -> CoreResult<TranscodeJob> {
        {
            let active = self.active.lock().unwrap();
            match active.as_ref() {
                None => return Err(CoreError::Internal("no transcode job to monitor".to_string())),
                Some(job) if job.is_done() => return Ok(job.clone()),
                Some(job) if job.status == JobStatus::Pending => {
                    return Err(CoreError::Internal(
                        "transcode job was never submitted".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }

        tokio::time::sleep(self.config.initial_delay).await;
        loop {
            self.poll_once().await;
            match self.current_job() {
                Some(job) if job.is_done() => {
                    info!("transcode {} reached terminal status {:?}", job.id, job.status);
                    return Ok(job);
                }
                Some(_) => {}
                None => {
                    return Err(CoreError::Internal(
                        "transcode job vanished while polling".to_string(),
                    ))
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// One status check against the remote execution
    async fn poll_once(&self) {
        let execution_id = {
            let active = self.active.lock().unwrap();
            match active.as_ref().and_then(|j| j.workflow_execution_id.clone()) {
                Some(id) => id,
                None => return,
            }
        };

        match self
            .client
            .get_execution(&self.config.workflow, &execution_id)
            .await
        {
            Ok(status) => {
                let mut active = self.active.lock().unwrap();
                let Some(job) = active.as_mut() else { return };
                match status.state {
                    ExecutionState::Active => job.advance_progress(),
                    ExecutionState::Succeeded => job.mark_completed(),
                    ExecutionState::Failed => job.mark_failed(
                        status.error.as_deref().unwrap_or("execution failed"),
                    ),
                    ExecutionState::Cancelled => job.mark_failed("execution cancelled"),
                }
            }
            Err(e) => {
                // A poll failure is terminal locally; the poll loop is a
                // deliberate repeated read, not a retry-after-failure
                warn!("poll for execution {} failed: {}", execution_id, e);
                let mut active = self.active.lock().unwrap();
                if let Some(job) = active.as_mut() {
                    job.mark_failed(&e.to_string());
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
