//! Fixtures and a scriptable in-memory backend for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::interfaces::{AttemptApi, SyncError};
use crate::types::{
    CodingAgentInitialRequest, ExecutionProcess, ExecutorAction, ExecutorActionType,
    FollowUpRequest, ProcessStatus, ProfileVariant, RunReason, TaskAttempt,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

pub(crate) fn process(run_reason: RunReason, status: ProcessStatus, offset_secs: i64) -> ExecutionProcess {
    let started_at = Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap()
        + chrono::Duration::seconds(offset_secs);
    ExecutionProcess {
        id: Uuid::new_v4(),
        task_attempt_id: Uuid::nil(),
        run_reason,
        status,
        executor_action: ExecutorAction::default(),
        exit_code: None,
        started_at,
        completed_at: None,
        created_at: started_at,
        updated_at: started_at,
        stdout: None,
        stderr: None,
    }
}

pub(crate) fn agent_action(profile: ProfileVariant) -> ExecutorAction {
    ExecutorAction::new(ExecutorActionType::CodingAgentInitialRequest(
        CodingAgentInitialRequest {
            prompt: "do the thing".to_string(),
            profile,
        },
    ))
}

#[derive(Default)]
pub(crate) struct MockApi {
    processes: Mutex<HashMap<Uuid, Vec<ExecutionProcess>>>,
    details: Mutex<HashMap<Uuid, ExecutionProcess>>,
    submitted: Mutex<Vec<(Uuid, FollowUpRequest)>>,
    editors: Mutex<Vec<(Uuid, Option<String>)>>,
    list_delay: Mutex<Option<Duration>>,
    list_calls: AtomicUsize,
    active_lists: AtomicUsize,
    max_active_lists: AtomicUsize,
    detail_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    fail_list: AtomicBool,
    fail_details: AtomicBool,
    fail_submit: AtomicBool,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_processes(&self, attempt_id: Uuid, processes: Vec<ExecutionProcess>) {
        self.processes.lock().insert(attempt_id, processes);
    }

    pub(crate) fn set_detail(&self, process: ExecutionProcess) {
        self.details.lock().insert(process.id, process);
    }

    pub(crate) fn set_list_delay(&self, delay: Option<Duration>) {
        *self.list_delay.lock() = delay;
    }

    pub(crate) fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_details(&self, fail: bool) {
        self.fail_details.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Most list calls ever outstanding at once.
    pub(crate) fn max_active_lists(&self) -> usize {
        self.max_active_lists.load(Ordering::SeqCst)
    }

    pub(crate) fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn submitted(&self) -> Vec<(Uuid, FollowUpRequest)> {
        self.submitted.lock().clone()
    }

    pub(crate) fn editors(&self) -> Vec<(Uuid, Option<String>)> {
        self.editors.lock().clone()
    }
}

#[async_trait]
impl AttemptApi for MockApi {
    async fn list_processes(&self, attempt_id: Uuid) -> Result<Vec<ExecutionProcess>, SyncError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active_lists.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_lists.fetch_max(active, Ordering::SeqCst);

        // The response reflects the backend as of when the request arrived.
        let processes = self
            .processes
            .lock()
            .get(&attempt_id)
            .cloned()
            .unwrap_or_default();
        let delay = *self.list_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.active_lists.fetch_sub(1, Ordering::SeqCst);

        if self.fail_list.load(Ordering::SeqCst) {
            return Err(SyncError::Network("list unavailable".to_string()));
        }
        Ok(processes)
    }

    async fn get_process(&self, process_id: Uuid) -> Result<ExecutionProcess, SyncError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_details.load(Ordering::SeqCst) {
            return Err(SyncError::Network("detail unavailable".to_string()));
        }
        self.details
            .lock()
            .get(&process_id)
            .cloned()
            .ok_or_else(|| SyncError::Api(format!("Process not found: {}", process_id)))
    }

    async fn get_attempt(&self, attempt_id: Uuid) -> Result<TaskAttempt, SyncError> {
        let now = Utc::now();
        Ok(TaskAttempt {
            id: attempt_id,
            task_id: Uuid::nil(),
            profile: Some("claude".to_string()),
            branch: None,
            base_branch: None,
            container_ref: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn submit_follow_up(
        &self,
        attempt_id: Uuid,
        request: &FollowUpRequest,
    ) -> Result<(), SyncError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(SyncError::Api("Executor is busy".to_string()));
        }
        self.submitted.lock().push((attempt_id, request.clone()));
        Ok(())
    }

    async fn stop_attempt(&self, _attempt_id: Uuid) -> Result<(), SyncError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn open_editor(
        &self,
        attempt_id: Uuid,
        editor_type: Option<&str>,
    ) -> Result<(), SyncError> {
        self.editors
            .lock()
            .push((attempt_id, editor_type.map(str::to_string)));
        Ok(())
    }
}
