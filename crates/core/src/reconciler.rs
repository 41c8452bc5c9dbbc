//! Attempt data reconciliation.

use crate::interfaces::{AttemptApi, SyncError};
use crate::profile::extract_profile;
use crate::store::{AttemptStore, ReconcileOutcome, Selection};
use crate::types::{AttemptData, RunReason};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Fetches an attempt's processes, enriches the interesting ones and hands
/// the result to the store.
pub struct AttemptDataReconciler<A: AttemptApi> {
    api: Arc<A>,
    store: Arc<AttemptStore>,
    in_flight: parking_lot::Mutex<InFlight>,
}

/// Serializes timer ticks and out-of-band triggers for one selection. A new
/// selection gets a fresh lock, so its first load never queues behind a
/// fetch for the attempt it replaced.
#[derive(Default)]
struct InFlight {
    selection: Option<Selection>,
    lock: Arc<Mutex<()>>,
}

impl<A: AttemptApi> AttemptDataReconciler<A> {
    pub fn new(api: Arc<A>, store: Arc<AttemptStore>) -> Self {
        Self {
            api,
            store,
            in_flight: parking_lot::Mutex::new(InFlight::default()),
        }
    }

    /// Run one reconciliation cycle for `attempt_id`.
    ///
    /// A network failure leaves the published data untouched. Results for an
    /// attempt that is no longer selected are dropped.
    pub async fn fetch(&self, attempt_id: Uuid) -> Result<ReconcileOutcome, SyncError> {
        let Some(selection) = self.current_selection(attempt_id) else {
            debug!("Skipping reconciliation for unselected attempt {}", attempt_id);
            return Ok(ReconcileOutcome::Discarded);
        };

        let lock = self.lock_for(selection);
        let _in_flight = lock.lock().await;
        if !self.store.is_current(selection) {
            debug!("Attempt {} deselected while waiting to reconcile", attempt_id);
            return Ok(ReconcileOutcome::Discarded);
        }

        let data = match self.assemble(attempt_id).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to reconcile attempt {}: {}", attempt_id, e);
                return Err(e);
            }
        };

        let process_count = data.processes.len();
        let outcome = self.store.publish(selection, data);
        match outcome {
            ReconcileOutcome::Published => {
                debug!("Published attempt {} ({} processes)", attempt_id, process_count)
            }
            ReconcileOutcome::Unchanged => debug!("Attempt {} unchanged", attempt_id),
            ReconcileOutcome::Discarded => {
                debug!("Discarded stale response for attempt {}", attempt_id)
            }
        }
        Ok(outcome)
    }

    fn lock_for(&self, selection: Selection) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock();
        match in_flight.selection {
            Some(current) if current == selection => {}
            // Superseded before it got here; the result is discarded anyway.
            Some(current) if current.generation > selection.generation => {
                return Arc::new(Mutex::new(()));
            }
            _ => {
                in_flight.selection = Some(selection);
                in_flight.lock = Arc::new(Mutex::new(()));
            }
        }
        in_flight.lock.clone()
    }

    fn current_selection(&self, attempt_id: Uuid) -> Option<Selection> {
        self.store
            .selection()
            .filter(|selection| selection.attempt_id == attempt_id)
    }

    async fn assemble(&self, attempt_id: Uuid) -> Result<AttemptData, SyncError> {
        let mut processes = self.api.list_processes(attempt_id).await?;
        processes.sort_by_key(|p| p.started_at);

        let mut data = AttemptData {
            processes,
            ..AttemptData::default()
        };

        let running: Vec<Uuid> = data
            .processes
            .iter()
            .filter(|p| p.is_running())
            .map(|p| p.id)
            .collect();
        for process_id in running {
            self.enrich(&mut data, process_id).await?;
        }

        // Setup output stays inspectable after the script finishes.
        let setup = data
            .processes
            .iter()
            .find(|p| p.run_reason == RunReason::SetupScript)
            .map(|p| p.id);
        if let Some(process_id) = setup {
            if !data.running_process_details.contains_key(&process_id) {
                self.enrich(&mut data, process_id).await?;
            }
        }

        for process in &data.processes {
            data.process_profiles
                .entry(process.id)
                .or_insert_with(|| extract_profile(&process.executor_action));
        }

        Ok(data)
    }

    async fn enrich(&self, data: &mut AttemptData, process_id: Uuid) -> Result<(), SyncError> {
        let detail = self.api.get_process(process_id).await?;
        data.process_profiles
            .insert(process_id, extract_profile(&detail.executor_action));
        data.running_process_details.insert(process_id, detail);
        Ok(())
    }
}
