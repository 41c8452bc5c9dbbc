//! Follow-up submission.

use crate::interfaces::{AttemptApi, SyncError};
use crate::reconciler::AttemptDataReconciler;
use crate::store::AttemptStore;
use crate::types::{FollowUpRequest, ProfileVariant};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Input buffer, in-flight flag and last inline error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowUpState {
    pub message: String,
    pub sending: bool,
    pub error: Option<String>,
}

/// Clears `sending` when dropped, whichever way the submission ends.
struct SendingGuard<'a> {
    state: &'a Mutex<FollowUpState>,
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().sending = false;
    }
}

pub struct FollowUpSubmitter<A: AttemptApi> {
    api: Arc<A>,
    store: Arc<AttemptStore>,
    reconciler: Arc<AttemptDataReconciler<A>>,
    state: Mutex<FollowUpState>,
    selected_profile: Mutex<Option<ProfileVariant>>,
    default_profile: Option<ProfileVariant>,
}

impl<A: AttemptApi> FollowUpSubmitter<A> {
    pub fn new(
        api: Arc<A>,
        store: Arc<AttemptStore>,
        reconciler: Arc<AttemptDataReconciler<A>>,
        default_profile: Option<ProfileVariant>,
    ) -> Self {
        Self {
            api,
            store,
            reconciler,
            state: Mutex::new(FollowUpState::default()),
            selected_profile: Mutex::new(None),
            default_profile,
        }
    }

    pub fn state(&self) -> FollowUpState {
        self.state.lock().clone()
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.state.lock().message = message.into();
    }

    pub fn select_profile(&self, profile: Option<ProfileVariant>) {
        *self.selected_profile.lock() = profile;
    }

    /// Explicit selection, else the attempt's declared profile, else the
    /// configured default.
    pub fn resolved_profile(&self) -> Option<ProfileVariant> {
        if let Some(profile) = self.selected_profile.lock().clone() {
            return Some(profile);
        }
        if let Some(label) = self.store.attempt_profile() {
            return Some(ProfileVariant::new(label));
        }
        self.default_profile.clone()
    }

    /// Whether a follow-up may be sent right now.
    pub fn can_send(&self) -> bool {
        self.blocked_reason().is_none()
    }

    fn blocked_reason(&self) -> Option<&'static str> {
        if self.store.selection().is_none() {
            return Some("no attempt selected");
        }
        if self.store.data().processes.is_empty() {
            return Some("attempt has no processes yet");
        }
        if self.store.is_running() {
            return Some("attempt is still running");
        }
        if self.state.lock().sending {
            return Some("a follow-up is already being sent");
        }
        None
    }

    /// Drop the buffered input and error, e.g. on attempt switch.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.message.clear();
        state.error = None;
        *self.selected_profile.lock() = None;
    }

    /// Submit `message` for the selected attempt.
    ///
    /// On success the input is cleared and one reconciliation runs right
    /// away. On failure the input is kept and the error text is stored for
    /// inline display.
    pub async fn submit(&self, message: &str, variant: Option<String>) -> Result<(), SyncError> {
        self.set_message(message);

        let selection = self
            .store
            .selection()
            .ok_or_else(|| SyncError::NotAllowed("no attempt selected".to_string()))?;
        let prompt = message.trim();
        if prompt.is_empty() {
            return Err(SyncError::EmptyMessage);
        }
        if self.resolved_profile().is_none() {
            return Err(SyncError::NoProfile);
        }

        let sending = self.begin_sending()?;
        let request = FollowUpRequest {
            prompt: prompt.to_string(),
            variant,
        };

        match self.api.submit_follow_up(selection.attempt_id, &request).await {
            Ok(()) => {
                info!("Follow-up sent for attempt {}", selection.attempt_id);
                {
                    let mut state = self.state.lock();
                    state.message.clear();
                    state.error = None;
                }
                drop(sending);
                // Out of band: the timer may be idle since the attempt was not running.
                let _ = self.reconciler.fetch(selection.attempt_id).await;
                Ok(())
            }
            Err(e) => {
                warn!("Follow-up failed for attempt {}: {}", selection.attempt_id, e);
                self.state.lock().error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn begin_sending(&self) -> Result<SendingGuard<'_>, SyncError> {
        if let Some(reason) = self.blocked_reason() {
            return Err(SyncError::NotAllowed(reason.to_string()));
        }
        let mut state = self.state.lock();
        if state.sending {
            return Err(SyncError::NotAllowed(
                "a follow-up is already being sent".to_string(),
            ));
        }
        state.sending = true;
        state.error = None;
        Ok(SendingGuard { state: &self.state })
    }
}
