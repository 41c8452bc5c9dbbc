//! Top-level handle tying the store, reconciler, poller and follow-up
//! submitter together for one selected attempt at a time.

use crate::catalog::ProfileCatalog;
use crate::follow_up::FollowUpSubmitter;
use crate::interfaces::{AttemptApi, SyncError};
use crate::poller::{PollScheduler, DEFAULT_POLL_INTERVAL};
use crate::reconciler::AttemptDataReconciler;
use crate::store::{AttemptStore, ReconcileOutcome};
use crate::types::{AttemptData, ProfileVariant, TaskAttempt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub poll_interval: Duration,
    /// Used for follow-ups when the attempt declares no profile.
    pub default_profile: Option<ProfileVariant>,
    pub catalog: ProfileCatalog,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_profile: None,
            catalog: ProfileCatalog::default(),
        }
    }
}

/// Receivers for every observable value the controller derives.
#[derive(Debug, Clone)]
pub struct AttemptWatch {
    pub data: watch::Receiver<Arc<AttemptData>>,
    pub running: watch::Receiver<bool>,
    pub default_variant: watch::Receiver<Option<String>>,
}

pub struct AttemptController<A: AttemptApi> {
    api: Arc<A>,
    store: Arc<AttemptStore>,
    reconciler: Arc<AttemptDataReconciler<A>>,
    follow_up: FollowUpSubmitter<A>,
    poll_interval: Duration,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl<A: AttemptApi> AttemptController<A> {
    pub fn new(api: Arc<A>, options: ControllerOptions) -> Self {
        let store = Arc::new(AttemptStore::new(options.catalog));
        let reconciler = Arc::new(AttemptDataReconciler::new(api.clone(), store.clone()));
        let follow_up = FollowUpSubmitter::new(
            api.clone(),
            store.clone(),
            reconciler.clone(),
            options.default_profile,
        );
        Self {
            api,
            store,
            reconciler,
            follow_up,
            poll_interval: options.poll_interval,
            driver: Mutex::new(None),
        }
    }

    /// Switch to `attempt` and load its data once.
    ///
    /// The selection takes effect immediately. The returned result reports
    /// only the initial load; polling continues either way while the attempt
    /// is running.
    pub async fn select_attempt(&self, attempt: &TaskAttempt) -> Result<ReconcileOutcome, SyncError> {
        self.stop_driver();
        self.follow_up.reset();
        self.store.select(Some(attempt.id), attempt.profile.clone());
        self.start_driver(attempt.id);
        info!("Selected attempt {}", attempt.id);

        self.reconciler.fetch(attempt.id).await
    }

    /// Look the attempt up by id, then select it.
    pub async fn select_attempt_id(&self, attempt_id: Uuid) -> Result<ReconcileOutcome, SyncError> {
        let attempt = self.api.get_attempt(attempt_id).await?;
        self.select_attempt(&attempt).await
    }

    pub fn clear_selection(&self) {
        self.stop_driver();
        self.follow_up.reset();
        self.store.select(None, None);
        debug!("Cleared attempt selection");
    }

    pub fn selected_attempt(&self) -> Option<Uuid> {
        self.store.selection().map(|selection| selection.attempt_id)
    }

    /// Reconcile now, outside the poll schedule.
    pub async fn fetch_attempt_data(&self, attempt_id: Uuid) -> Result<ReconcileOutcome, SyncError> {
        self.reconciler.fetch(attempt_id).await
    }

    pub fn set_stopping(&self, stopping: bool) {
        self.store.set_stopping(stopping);
    }

    pub fn set_catalog(&self, catalog: ProfileCatalog) {
        self.store.set_catalog(catalog);
    }

    /// Ask the backend to stop the selected attempt's processes.
    ///
    /// The attempt reads as not running while the request is outstanding.
    pub async fn stop_attempt(&self) -> Result<(), SyncError> {
        let attempt_id = self.require_selection()?;
        self.store.set_stopping(true);
        let result = self.api.stop_attempt(attempt_id).await;
        self.store.set_stopping(false);

        if let Err(e) = result {
            warn!("Failed to stop attempt {}: {}", attempt_id, e);
            return Err(e);
        }
        info!("Stopped attempt {}", attempt_id);
        let _ = self.reconciler.fetch(attempt_id).await;
        Ok(())
    }

    pub async fn open_editor(&self, editor_type: Option<&str>) -> Result<(), SyncError> {
        let attempt_id = self.require_selection()?;
        self.api.open_editor(attempt_id, editor_type).await
    }

    pub fn attempt_data(&self) -> Arc<AttemptData> {
        self.store.data()
    }

    pub fn is_attempt_running(&self) -> bool {
        self.store.is_running()
    }

    pub fn default_follow_up_variant(&self) -> Option<String> {
        self.store.default_variant()
    }

    pub fn subscribe(&self) -> AttemptWatch {
        AttemptWatch {
            data: self.store.subscribe_data(),
            running: self.store.subscribe_running(),
            default_variant: self.store.subscribe_variant(),
        }
    }

    pub fn follow_up(&self) -> &FollowUpSubmitter<A> {
        &self.follow_up
    }

    /// Cancel polling. Any fetch already in flight still completes.
    pub fn shutdown(&self) {
        self.stop_driver();
    }

    fn require_selection(&self) -> Result<Uuid, SyncError> {
        self.selected_attempt()
            .ok_or_else(|| SyncError::NotAllowed("no attempt selected".to_string()))
    }

    fn start_driver(&self, attempt_id: Uuid) {
        let mut running_rx = self.store.subscribe_running();
        let reconciler = self.reconciler.clone();
        let mut scheduler = PollScheduler::new(self.poll_interval);

        // Dropping the scheduler on abort disarms its timer.
        let handle = tokio::spawn(async move {
            loop {
                let running = *running_rx.borrow_and_update();
                if running {
                    scheduler.arm(attempt_id, reconciler.clone());
                } else {
                    scheduler.disarm();
                }
                if running_rx.changed().await.is_err() {
                    break;
                }
            }
        });

        if let Some(previous) = self.driver.lock().replace(handle) {
            previous.abort();
        }
    }

    fn stop_driver(&self) {
        if let Some(handle) = self.driver.lock().take() {
            handle.abort();
        }
    }
}

impl<A: AttemptApi> Drop for AttemptController<A> {
    fn drop(&mut self) {
        self.stop_driver();
    }
}
