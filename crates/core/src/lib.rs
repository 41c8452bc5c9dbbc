pub mod catalog;
pub mod controller;
pub mod follow_up;
pub mod interfaces;
pub mod poller;
pub mod profile;
pub mod reconciler;
pub mod running;
pub mod store;
pub mod types;
pub mod variant;

#[cfg(test)]
mod test_support;

pub use catalog::{AgentProfile, ProfileCatalog, VariantEntry};
pub use controller::{AttemptController, AttemptWatch, ControllerOptions};
pub use follow_up::{FollowUpState, FollowUpSubmitter};
pub use interfaces::{AttemptApi, SyncError};
pub use poller::{PollScheduler, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use profile::extract_profile;
pub use reconciler::AttemptDataReconciler;
pub use running::is_attempt_running;
pub use store::{AttemptStore, ReconcileOutcome, Selection};
pub use types::*;
pub use variant::default_follow_up_variant;
