//! Wire and state types shared by the synchronization components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Why an execution process was started within an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunReason {
    SetupScript,
    CleanupScript,
    CodingAgent,
    DevServer,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Completed,
    Failed,
    Killed,
    #[serde(other)]
    Unknown,
}

/// Agent profile label plus an optional sub-variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileVariant {
    pub profile: String,
    #[serde(default)]
    pub variant: Option<String>,
}

impl ProfileVariant {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            variant: None,
        }
    }

    pub fn with_variant(profile: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            variant: Some(variant.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingAgentInitialRequest {
    pub prompt: String,
    pub profile: ProfileVariant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingAgentFollowUpRequest {
    pub prompt: String,
    pub session_id: String,
    pub profile: ProfileVariant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub script: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// What a process was asked to execute, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutorActionType {
    CodingAgentInitialRequest(CodingAgentInitialRequest),
    CodingAgentFollowUpRequest(CodingAgentFollowUpRequest),
    ScriptRequest(ScriptRequest),
    /// Any discriminant this client does not recognize, or none at all.
    #[serde(other)]
    Unknown,
}

/// Executor action with its optional chained successor.
///
/// Decoding never fails: a missing or malformed `typ` becomes
/// [`ExecutorActionType::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct ExecutorAction {
    pub typ: ExecutorActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<Box<ExecutorAction>>,
}

impl ExecutorAction {
    pub fn new(typ: ExecutorActionType) -> Self {
        Self {
            typ,
            next_action: None,
        }
    }
}

impl Default for ExecutorAction {
    fn default() -> Self {
        Self::new(ExecutorActionType::Unknown)
    }
}

impl From<serde_json::Value> for ExecutorAction {
    fn from(value: serde_json::Value) -> Self {
        let typ = value
            .get("typ")
            .cloned()
            .and_then(|typ| serde_json::from_value(typ).ok())
            .unwrap_or(ExecutorActionType::Unknown);
        let next_action = value
            .get("next_action")
            .filter(|next| next.is_object())
            .cloned()
            .map(|next| Box::new(ExecutorAction::from(next)));

        Self { typ, next_action }
    }
}

/// One step of an attempt (setup, agent run, cleanup, dev server).
///
/// List responses carry the lightweight summary; detail responses also carry
/// captured `stdout`/`stderr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionProcess {
    pub id: Uuid,
    pub task_attempt_id: Uuid,
    pub run_reason: RunReason,
    pub status: ProcessStatus,
    #[serde(default)]
    pub executor_action: ExecutorAction,
    #[serde(default)]
    pub exit_code: Option<i64>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl ExecutionProcess {
    pub fn is_running(&self) -> bool {
        self.status == ProcessStatus::Running
    }
}

/// Everything the UI knows about the selected attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptData {
    /// Ascending by start time; order is significant for equality.
    pub processes: Vec<ExecutionProcess>,
    pub running_process_details: HashMap<Uuid, ExecutionProcess>,
    pub process_profiles: HashMap<Uuid, Option<ProfileVariant>>,
}

impl AttemptData {
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn profile_of(&self, process_id: &Uuid) -> Option<&ProfileVariant> {
        self.process_profiles.get(process_id).and_then(Option::as_ref)
    }
}

/// Task attempt record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAttempt {
    pub id: Uuid,
    pub task_id: Uuid,
    /// Profile label the attempt was started with.
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub base_branch: Option<String>,
    #[serde(default)]
    pub container_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub prompt: String,
    pub variant: Option<String>,
}
