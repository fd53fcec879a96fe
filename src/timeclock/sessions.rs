use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::notification::RemovalCause;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use super::workflow::{PunchWorkflow, WorkflowDeps, WorkflowSettings};

/// Open kiosk wizards keyed by session id.
///
/// Whatever removes an entry (idle expiry, capacity pressure, explicit close)
/// tears the workflow down, so an abandoned kiosk never keeps the camera on.
#[derive(Clone)]
pub struct KioskSessions {
    cache: Cache<Uuid, Arc<PunchWorkflow>>,
    deps: WorkflowDeps,
    settings: WorkflowSettings,
    _housekeeper: Arc<Housekeeper>,
}

/// The cache only evicts while some operation runs its pending tasks, so a
/// quiet server needs a ticker to expire idle kiosks. Stops with the last
/// `KioskSessions` clone.
struct Housekeeper(JoinHandle<()>);

impl Drop for Housekeeper {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl KioskSessions {
    /// Spawns the housekeeping ticker, so it needs a running Tokio runtime.
    pub fn new(deps: WorkflowDeps, settings: WorkflowSettings, idle: Duration, max_sessions: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .eviction_listener(|id: Arc<Uuid>, workflow: Arc<PunchWorkflow>, cause: RemovalCause| {
                debug!(session_id = %id, ?cause, "Kiosk session removed");
                workflow.teardown();
            })
            .build();

        let period = (idle / 2).max(Duration::from_millis(10));
        let housekeeping = cache.clone();
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                housekeeping.run_pending_tasks().await;
            }
        });

        Self {
            cache,
            deps,
            settings,
            _housekeeper: Arc::new(Housekeeper(ticker)),
        }
    }

    /// Activates a fresh workflow (roster loaded once) and registers it.
    pub async fn open(&self) -> (Uuid, Arc<PunchWorkflow>) {
        let id = Uuid::new_v4();
        let workflow = Arc::new(PunchWorkflow::activate(self.deps.clone(), self.settings).await);
        self.cache.insert(id, workflow.clone()).await;
        info!(session_id = %id, "Kiosk session opened");
        (id, workflow)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<PunchWorkflow>> {
        self.cache.get(id).await
    }

    /// Returns false when the session was already gone.
    pub async fn close(&self, id: &Uuid) -> bool {
        match self.cache.remove(id).await {
            Some(_) => {
                info!(session_id = %id, "Kiosk session closed");
                true
            }
            None => false,
        }
    }
}
