use std::sync::Arc;

use actix_web::web::{self, Data};

use crate::{
    config::{CameraMode, Config},
    routes,
    session_lock::InactivityLock,
    store::DataApi,
    timeclock::{
        devices::{ApiBackend, CameraCapture, StreamRequest},
        sessions::KioskSessions,
        simulated::{FixedGeolocation, SimulatedCamera},
        workflow::{WorkflowDeps, WorkflowSettings},
    },
};

/// Everything the handlers pull out of `app_data`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub api: Data<dyn DataApi>,
    pub lock: Data<InactivityLock>,
    pub sessions: Data<KioskSessions>,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn DataApi>, lock: InactivityLock) -> Self {
        let camera: Arc<dyn CameraCapture> = match config.camera_mode {
            CameraMode::Simulated => Arc::new(SimulatedCamera::new(
                config.camera_width,
                config.camera_height,
                config.camera_warmup,
            )),
            CameraMode::Disabled => Arc::new(SimulatedCamera::disabled()),
        };
        let backend = Arc::new(ApiBackend(api.clone()));

        let deps = WorkflowDeps {
            camera,
            geolocation: Arc::new(FixedGeolocation::new(config.kiosk_position)),
            registration: backend.clone(),
            roster: backend,
        };
        let settings = WorkflowSettings {
            display_delay: config.punch_reset_delay,
            stream_request: StreamRequest::KIOSK,
        };
        let sessions = KioskSessions::new(
            deps,
            settings,
            config.kiosk_session_idle,
            config.kiosk_max_sessions,
        );

        Self {
            config,
            api: Data::from(api),
            lock: Data::new(lock),
            sessions: Data::new(sessions),
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(Data::new(self.config.clone()))
            .app_data(self.api.clone())
            .app_data(self.lock.clone())
            .app_data(self.sessions.clone());
        routes::configure(cfg, &self.config);
    }
}
