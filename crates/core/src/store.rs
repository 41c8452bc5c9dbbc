//! Shared attempt state.
//!
//! The store is the single owner of the selected attempt's [`AttemptData`]
//! and of the inputs the derived values depend on. Only the reconciliation
//! path replaces the data; everything else reads `Arc` snapshots or
//! subscribes to the watch channels.

use crate::catalog::ProfileCatalog;
use crate::running::is_attempt_running;
use crate::types::AttemptData;
use crate::variant::default_follow_up_variant;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Result of handing a freshly assembled [`AttemptData`] to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A new snapshot replaced the previous one.
    Published,
    /// Equal by value to the current snapshot; the old reference was kept.
    Unchanged,
    /// The selection changed while the fetch was in flight.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub attempt_id: Uuid,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    selection: Option<Selection>,
    generation: u64,
    attempt_profile: Option<String>,
    stopping: bool,
    catalog: ProfileCatalog,
}

pub struct AttemptStore {
    state: Mutex<StoreState>,
    data_tx: watch::Sender<Arc<AttemptData>>,
    running_tx: watch::Sender<bool>,
    variant_tx: watch::Sender<Option<String>>,
}

impl AttemptStore {
    pub fn new(catalog: ProfileCatalog) -> Self {
        let (data_tx, _) = watch::channel(Arc::new(AttemptData::default()));
        let (running_tx, _) = watch::channel(false);
        let (variant_tx, _) = watch::channel(None);
        Self {
            state: Mutex::new(StoreState {
                catalog,
                ..StoreState::default()
            }),
            data_tx,
            running_tx,
            variant_tx,
        }
    }

    /// Select an attempt (or none) and start a new generation with empty data.
    pub fn select(&self, attempt_id: Option<Uuid>, attempt_profile: Option<String>) -> Option<Selection> {
        let mut state = self.state.lock();
        state.generation += 1;
        let generation = state.generation;
        state.selection = attempt_id.map(|attempt_id| Selection {
            attempt_id,
            generation,
        });
        state.attempt_profile = attempt_profile;
        state.stopping = false;
        self.data_tx.send_replace(Arc::new(AttemptData::default()));
        self.recompute(&state);
        state.selection
    }

    pub fn selection(&self) -> Option<Selection> {
        self.state.lock().selection
    }

    pub fn is_current(&self, selection: Selection) -> bool {
        self.state.lock().selection == Some(selection)
    }

    /// Replace the data if `selection` is still current and the value changed.
    pub fn publish(&self, selection: Selection, data: AttemptData) -> ReconcileOutcome {
        let state = self.state.lock();
        if state.selection != Some(selection) {
            return ReconcileOutcome::Discarded;
        }

        let changed = self.data_tx.send_if_modified(|current| {
            if **current == data {
                false
            } else {
                *current = Arc::new(data);
                true
            }
        });

        if !changed {
            return ReconcileOutcome::Unchanged;
        }
        self.recompute(&state);
        ReconcileOutcome::Published
    }

    pub fn set_stopping(&self, stopping: bool) {
        let mut state = self.state.lock();
        state.stopping = stopping;
        self.recompute(&state);
    }

    pub fn set_attempt_profile(&self, attempt_profile: Option<String>) {
        let mut state = self.state.lock();
        state.attempt_profile = attempt_profile;
        self.recompute(&state);
    }

    pub fn set_catalog(&self, catalog: ProfileCatalog) {
        let mut state = self.state.lock();
        state.catalog = catalog;
        self.recompute(&state);
    }

    pub fn data(&self) -> Arc<AttemptData> {
        self.data_tx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        *self.running_tx.borrow()
    }

    pub fn is_stopping(&self) -> bool {
        self.state.lock().stopping
    }

    pub fn default_variant(&self) -> Option<String> {
        self.variant_tx.borrow().clone()
    }

    pub fn attempt_profile(&self) -> Option<String> {
        self.state.lock().attempt_profile.clone()
    }

    pub fn catalog(&self) -> ProfileCatalog {
        self.state.lock().catalog.clone()
    }

    pub fn subscribe_data(&self) -> watch::Receiver<Arc<AttemptData>> {
        self.data_tx.subscribe()
    }

    pub fn subscribe_running(&self) -> watch::Receiver<bool> {
        self.running_tx.subscribe()
    }

    pub fn subscribe_variant(&self) -> watch::Receiver<Option<String>> {
        self.variant_tx.subscribe()
    }

    fn recompute(&self, state: &StoreState) {
        let data = self.data();
        let running = state.selection.is_some() && is_attempt_running(&data.processes, state.stopping);
        let variant =
            default_follow_up_variant(&data, state.attempt_profile.as_deref(), &state.catalog);

        self.running_tx.send_if_modified(|current| replace_if_changed(current, running));
        self.variant_tx.send_if_modified(|current| replace_if_changed(current, variant));
    }
}

fn replace_if_changed<T: PartialEq>(current: &mut T, next: T) -> bool {
    if *current == next {
        return false;
    }
    *current = next;
    true
}
