use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use utoipa::ToSchema;

pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// The dashboard-wide inactivity lock. Started and shut down by `main`.
pub static INACTIVITY_LOCK: Lazy<InactivityLock> = Lazy::new(InactivityLock::default);

/// Pointer, keyboard, click and scroll events are reported by the dashboard
/// through `POST /api/activity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityKind {
    PointerMove,
    KeyDown,
    Click,
    Scroll,
    /// Any authenticated API call.
    Request,
}

struct LockState {
    timeout: Duration,
    listened: HashSet<ActivityKind>,
    locked: bool,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// One idle timer shared by every activity source. After `timeout` without
/// activity the session locks; while locked, activity is ignored until
/// [`InactivityLock::unlock`].
#[derive(Clone)]
pub struct InactivityLock {
    state: Arc<Mutex<LockState>>,
}

impl Default for InactivityLock {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(LockState {
                timeout: DEFAULT_INACTIVITY_TIMEOUT,
                listened: HashSet::new(),
                locked: false,
                generation: 0,
                timer: None,
            })),
        }
    }
}

impl InactivityLock {
    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().expect("inactivity lock poisoned")
    }

    /// Subscribes every activity kind and arms the timer. Calling it again
    /// restarts with the new timeout.
    pub fn start(&self, timeout: Duration) {
        let mut state = self.state();
        state.timeout = timeout;
        state.listened = ActivityKind::iter().collect();
        state.locked = false;
        self.arm(&mut state);
        info!(timeout_secs = timeout.as_secs(), "Inactivity lock started");
    }

    /// Unsubscribes everything and cancels the timer.
    pub fn shutdown(&self) {
        let mut state = self.state();
        state.listened.clear();
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        info!("Inactivity lock stopped");
    }

    /// Resets the idle timer. Returns false when the activity was ignored
    /// (not listening, or already locked).
    pub fn record_activity(&self, kind: ActivityKind) -> bool {
        let mut state = self.state();
        if state.locked || !state.listened.contains(&kind) {
            return false;
        }
        self.arm(&mut state);
        true
    }

    pub fn is_locked(&self) -> bool {
        self.state().locked
    }

    pub fn unlock(&self) {
        let mut state = self.state();
        if !state.locked {
            return;
        }
        state.locked = false;
        if !state.listened.is_empty() {
            self.arm(&mut state);
        }
        info!("Session unlocked");
    }

    fn arm(&self, state: &mut LockState) {
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation += 1;

        let generation = state.generation;
        let timeout = state.timeout;
        let shared = self.state.clone();
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut state = shared.lock().expect("inactivity lock poisoned");
            if state.generation == generation {
                state.locked = true;
                state.timer = None;
                debug!("Session locked after inactivity");
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(900);

    #[tokio::test(start_paused = true)]
    async fn locks_after_timeout_without_activity() {
        let lock = InactivityLock::default();
        lock.start(TIMEOUT);

        tokio::time::sleep(TIMEOUT - Duration::from_secs(1)).await;
        assert!(!lock.is_locked());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(lock.is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_resets_the_single_timer() {
        let lock = InactivityLock::default();
        lock.start(TIMEOUT);

        for kind in [ActivityKind::PointerMove, ActivityKind::KeyDown, ActivityKind::Scroll] {
            tokio::time::sleep(Duration::from_secs(600)).await;
            assert!(lock.record_activity(kind));
        }
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(!lock.is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_is_ignored_once_locked() {
        let lock = InactivityLock::default();
        lock.start(TIMEOUT);
        tokio::time::sleep(TIMEOUT + Duration::from_secs(1)).await;

        assert!(!lock.record_activity(ActivityKind::Click));
        assert!(lock.is_locked());

        lock.unlock();
        assert!(!lock.is_locked());
        assert!(lock.record_activity(ActivityKind::Click));

        tokio::time::sleep(TIMEOUT + Duration::from_secs(2)).await;
        assert!(lock.is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_listening() {
        let lock = InactivityLock::default();
        lock.start(TIMEOUT);
        lock.shutdown();

        assert!(!lock.record_activity(ActivityKind::Request));
        tokio::time::sleep(TIMEOUT * 2).await;
        assert!(!lock.is_locked());
    }
}
