//! Fixed-interval polling of the selected attempt.

use crate::interfaces::AttemptApi;
use crate::reconciler::AttemptDataReconciler;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Shorter periods are raised to this; a zero period would panic the timer.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct ActiveTimer {
    attempt_id: Uuid,
    handle: JoinHandle<()>,
}

/// Owns at most one polling timer.
///
/// Arming for a different attempt, disarming and dropping all abort the
/// pending timer. A fetch already in flight is left to finish.
pub struct PollScheduler {
    period: Duration,
    active: Option<ActiveTimer>,
}

impl PollScheduler {
    pub fn new(period: Duration) -> Self {
        if period < MIN_POLL_INTERVAL {
            warn!(
                "Poll interval {:?} is below the minimum, using {:?}",
                period, MIN_POLL_INTERVAL
            );
        }
        Self {
            period: period.max(MIN_POLL_INTERVAL),
            active: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_armed(&self) -> bool {
        self.active
            .as_ref()
            .map(|timer| !timer.handle.is_finished())
            .unwrap_or(false)
    }

    pub fn armed_for(&self) -> Option<Uuid> {
        self.active
            .as_ref()
            .filter(|timer| !timer.handle.is_finished())
            .map(|timer| timer.attempt_id)
    }

    /// Start polling `attempt_id`. A no-op if already polling it.
    pub fn arm<A: AttemptApi>(&mut self, attempt_id: Uuid, reconciler: Arc<AttemptDataReconciler<A>>) {
        if self.armed_for() == Some(attempt_id) {
            return;
        }
        self.disarm();

        let period = self.period;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reconciler = reconciler.clone();
                let fetch = tokio::spawn(async move { reconciler.fetch(attempt_id).await });
                // Errors are already logged by the reconciler; the next tick retries.
                let _ = fetch.await;
            }
        });

        debug!("Armed poll timer for attempt {} every {:?}", attempt_id, period);
        self.active = Some(ActiveTimer { attempt_id, handle });
    }

    pub fn disarm(&mut self) {
        if let Some(timer) = self.active.take() {
            timer.handle.abort();
            debug!("Disarmed poll timer for attempt {}", timer.attempt_id);
        }
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}
