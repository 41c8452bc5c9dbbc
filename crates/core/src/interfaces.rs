//! Remote collaborator interface and the error taxonomy.

use crate::types::{ExecutionProcess, FollowUpRequest, TaskAttempt};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Synchronization errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("No agent profile selected")]
    NoProfile,

    #[error("Follow-up not allowed: {0}")]
    NotAllowed(String),
}

impl SyncError {
    /// Errors raised client-side before any request is issued.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SyncError::EmptyMessage | SyncError::NoProfile | SyncError::NotAllowed(_)
        )
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Decode(e.to_string())
    }
}

/// Backend calls the controller depends on.
#[async_trait]
pub trait AttemptApi: Send + Sync + 'static {
    /// List the lightweight process summaries of an attempt.
    async fn list_processes(&self, attempt_id: Uuid) -> Result<Vec<ExecutionProcess>, SyncError>;

    /// Fetch one process with full detail, including its executor action.
    async fn get_process(&self, process_id: Uuid) -> Result<ExecutionProcess, SyncError>;

    async fn get_attempt(&self, attempt_id: Uuid) -> Result<TaskAttempt, SyncError>;

    async fn submit_follow_up(
        &self,
        attempt_id: Uuid,
        request: &FollowUpRequest,
    ) -> Result<(), SyncError>;

    async fn stop_attempt(&self, attempt_id: Uuid) -> Result<(), SyncError>;

    /// Forwarded as-is; the backend decides which editor to launch.
    async fn open_editor(&self, attempt_id: Uuid, editor_type: Option<&str>)
        -> Result<(), SyncError>;
}
