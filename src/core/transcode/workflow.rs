//! Workflow Engine Client
//!
//! Client seam for the remote transcode workflow engine. An execution is
//! created under a named workflow; its resource name embeds the execution
//! identifier as the final path segment, and its state is polled until
//! terminal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Execution Model
// =============================================================================

/// Remote execution state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    Active,
    Succeeded,
    Failed,
    Cancelled,
}

impl ExecutionState {
    /// Remote terminal states admit no further polling
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionState::Active)
    }
}

/// Reference returned by execution creation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionRef {
    /// Full resource name; the execution ID is its final path segment
    pub name: String,
}

impl ExecutionRef {
    /// Extracts the execution identifier from the resource name
    pub fn execution_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Polled execution status
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    pub state: ExecutionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// Client Trait
// =============================================================================

/// Remote workflow engine operations
#[async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Creates an execution of a named workflow with JSON arguments
    async fn create_execution(
        &self,
        workflow: &str,
        args: serde_json::Value,
    ) -> CoreResult<ExecutionRef>;

    /// Fetches the current status of an execution
    async fn get_execution(&self, workflow: &str, execution_id: &str)
        -> CoreResult<ExecutionStatus>;
}

// =============================================================================
// HTTP Client
// =============================================================================

/// HTTP-backed workflow engine client
pub struct HttpWorkflowClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWorkflowClient {
    /// Creates a client rooted at the workflow engine API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn workflow_url(&self, workflow: &str) -> String {
        format!(
            "{}/workflows/{}/executions",
            self.base_url.trim_end_matches('/'),
            workflow
        )
    }
}

#[async_trait]
impl WorkflowClient for HttpWorkflowClient {
    async fn create_execution(
        &self,
        workflow: &str,
        args: serde_json::Value,
    ) -> CoreResult<ExecutionRef> {
        let resp = self
            .client
            .post(self.workflow_url(workflow))
            .json(&serde_json::json!({ "argument": args.to_string() }))
            .send()
            .await
            .map_err(|e| CoreError::Workflow(format!("create execution: {}", e)))?
            .error_for_status()
            .map_err(|e| CoreError::Workflow(format!("create execution: {}", e)))?;

        resp.json::<ExecutionRef>()
            .await
            .map_err(|e| CoreError::Workflow(format!("create execution body: {}", e)))
    }

    async fn get_execution(
        &self,
        workflow: &str,
        execution_id: &str,
    ) -> CoreResult<ExecutionStatus> {
        let url = format!("{}/{}", self.workflow_url(workflow), execution_id);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::Workflow(format!("get execution: {}", e)))?
            .error_for_status()
            .map_err(|e| CoreError::Workflow(format!("get execution: {}", e)))?;

        resp.json::<ExecutionStatus>()
            .await
            .map_err(|e| CoreError::Workflow(format!("get execution body: {}", e)))
    }
}

// =============================================================================
// Mock Client
// =============================================================================

/// Scripted workflow client for tests and offline development.
///
/// Polls pop states from a queue; once the queue is empty the last state is
/// repeated.
pub struct MockWorkflowClient {
    fail_submission: bool,
    states: Mutex<VecDeque<ExecutionState>>,
    last: Mutex<ExecutionState>,
    poll_count: Mutex<u32>,
}

impl MockWorkflowClient {
    /// Creates a client that plays back the given poll states in order
    pub fn with_states(states: Vec<ExecutionState>) -> Self {
        Self {
            fail_submission: false,
            states: Mutex::new(states.into()),
            last: Mutex::new(ExecutionState::Active),
            poll_count: Mutex::new(0),
        }
    }

    /// Creates a client whose submissions are rejected
    pub fn failing_submission() -> Self {
        Self {
            fail_submission: true,
            states: Mutex::new(VecDeque::new()),
            last: Mutex::new(ExecutionState::Active),
            poll_count: Mutex::new(0),
        }
    }

    /// Number of polls observed so far
    pub fn poll_count(&self) -> u32 {
        *self.poll_count.lock().unwrap()
    }
}

#[async_trait]
impl WorkflowClient for MockWorkflowClient {
    async fn create_execution(
        &self,
        workflow: &str,
        _args: serde_json::Value,
    ) -> CoreResult<ExecutionRef> {
        if self.fail_submission {
            return Err(CoreError::Workflow("submission rejected".to_string()));
        }
        Ok(ExecutionRef {
            name: format!("workflows/{}/executions/exec-mock-1", workflow),
        })
    }

    async fn get_execution(
        &self,
        _workflow: &str,
        _execution_id: &str,
    ) -> CoreResult<ExecutionStatus> {
        *self.poll_count.lock().unwrap() += 1;

        let state = {
            let mut states = self.states.lock().unwrap();
            match states.pop_front() {
                Some(s) => {
                    *self.last.lock().unwrap() = s;
                    s
                }
                None => *self.last.lock().unwrap(),
            }
        };

        Ok(ExecutionStatus {
            state,
            error: match state {
                ExecutionState::Failed => Some("remote failure".to_string()),
                _ => None,
            },
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_id_is_final_path_segment() {
        let exec = ExecutionRef {
            name: "projects/p/locations/l/workflows/w/executions/abc123".to_string(),
        };
        assert_eq!(exec.execution_id(), "abc123");

        let bare = ExecutionRef {
            name: "abc123".to_string(),
        };
        assert_eq!(bare.execution_id(), "abc123");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ExecutionState::Active.is_terminal());
        assert!(ExecutionState::Succeeded.is_terminal());
        assert!(ExecutionState::Failed.is_terminal());
        assert!(ExecutionState::Cancelled.is_terminal());
    }

    #[test]
    fn test_execution_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&ExecutionState::Succeeded).unwrap(),
            "\"SUCCEEDED\""
        );
        let parsed: ExecutionState = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(parsed, ExecutionState::Cancelled);
    }

    #[tokio::test]
    async fn test_mock_replays_states_then_repeats_last() {
        let mock = MockWorkflowClient::with_states(vec![
            ExecutionState::Active,
            ExecutionState::Succeeded,
        ]);

        let s1 = mock.get_execution("w", "e").await.unwrap();
        let s2 = mock.get_execution("w", "e").await.unwrap();
        let s3 = mock.get_execution("w", "e").await.unwrap();

        assert_eq!(s1.state, ExecutionState::Active);
        assert_eq!(s2.state, ExecutionState::Succeeded);
        assert_eq!(s3.state, ExecutionState::Succeeded);
        assert_eq!(mock.poll_count(), 3);
    }
}
