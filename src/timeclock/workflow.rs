//! Check-in / check-out wizard.
//!
//! `SelectDirection -> SelectEmployee -> Capturing -> Submitting -> Completed`,
//! with cancel returning to `SelectDirection` from anywhere. Entering
//! `Capturing` starts one camera and one geolocation acquisition that race
//! independently. The camera is held through a [`CameraLease`] so every exit
//! path (cancel, success, teardown) releases it.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use strum_macros::Display;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::devices::{
    CameraCapture, CameraLease, EmployeeRoster, Geolocation, PunchRegistration, ReadyState, StreamRequest,
};
use crate::model::{
    employee::{Employee, filter_roster},
    punch::{GeoPoint, PunchDirection, PunchEvent, PunchSubmission},
};

pub const DEFAULT_DISPLAY_DELAY: Duration = Duration::from_secs(4);

#[derive(Clone)]
pub struct WorkflowDeps {
    pub camera: Arc<dyn CameraCapture>,
    pub geolocation: Arc<dyn Geolocation>,
    pub registration: Arc<dyn PunchRegistration>,
    pub roster: Arc<dyn EmployeeRoster>,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkflowSettings {
    /// How long a successful punch stays on screen before the reset.
    pub display_delay: Duration,
    pub stream_request: StreamRequest,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            display_delay: DEFAULT_DISPLAY_DELAY,
            stream_request: StreamRequest::KIOSK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Display)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SelectDirection,
    SelectEmployee,
    Capturing,
    Submitting,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Advisory {
    pub level: AdvisoryLevel,
    pub text: String,
}

impl Advisory {
    fn info(text: impl Into<String>) -> Self {
        Self { level: AdvisoryLevel::Info, text: text.into() }
    }

    fn success(text: impl Into<String>) -> Self {
        Self { level: AdvisoryLevel::Success, text: text.into() }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { level: AdvisoryLevel::Error, text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CameraStatus {
    Idle,
    Starting,
    Live,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LocationStatus {
    Idle,
    Locating,
    Acquired { latitude: f64, longitude: f64 },
    Unavailable { reason: String },
}

/// Why a confirm press did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredReason {
    NotCapturing,
    NoStream,
    SubmissionInFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Ignored(IgnoredReason),
    /// The stream has no usable frame yet; nothing was submitted.
    AwaitingFrame,
    Recorded(PunchEvent),
    Failed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("cannot {action} while in {stage}")]
    InvalidTransition { stage: Stage, action: &'static str },

    #[error("employee {0} is not on the active roster")]
    UnknownEmployee(String),
}

/// Snapshot of the wizard for rendering.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkflowView {
    pub stage: Stage,
    pub direction: Option<PunchDirection>,
    pub employee: Option<Employee>,
    pub camera: CameraStatus,
    pub location: LocationStatus,
    pub advisory: Option<Advisory>,
    pub submitting: bool,
    pub can_confirm: bool,
    /// Last recorded punch, without the captured image.
    pub last_punch: Option<PunchEvent>,
}

struct Inner {
    stage: Stage,
    /// Bumped whenever the transient state is discarded; late async results
    /// carrying an older value are dropped (and their streams released).
    generation: u64,
    roster: Vec<Employee>,
    direction: Option<PunchDirection>,
    employee: Option<Employee>,
    camera: Option<CameraLease>,
    camera_status: CameraStatus,
    location: Option<GeoPoint>,
    location_status: LocationStatus,
    submitting: bool,
    advisory: Option<Advisory>,
    last_punch: Option<PunchEvent>,
    acquisitions: Vec<JoinHandle<()>>,
    reset_timer: Option<JoinHandle<()>>,
}

impl Inner {
    fn expect_stage(&self, stage: Stage, action: &'static str) -> Result<(), WorkflowError> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition { stage: self.stage, action })
        }
    }

    /// Drops every transient field and returns to the first step. The roster
    /// and an in-flight submission flag survive.
    fn reset(&mut self) {
        if let Some(timer) = self.reset_timer.take() {
            timer.abort();
        }
        self.generation += 1;
        self.stage = Stage::SelectDirection;
        self.direction = None;
        self.employee = None;
        self.camera = None;
        self.camera_status = CameraStatus::Idle;
        self.location = None;
        self.location_status = LocationStatus::Idle;
        self.advisory = None;
        self.last_punch = None;
    }

    fn view(&self) -> WorkflowView {
        WorkflowView {
            stage: self.stage,
            direction: self.direction,
            employee: self.employee.clone(),
            camera: self.camera_status.clone(),
            location: self.location_status.clone(),
            advisory: self.advisory.clone(),
            submitting: self.submitting,
            can_confirm: self.stage == Stage::Capturing && self.camera.is_some() && !self.submitting,
            last_punch: self.last_punch.as_ref().map(|p| PunchEvent {
                captured_image: None,
                ..p.clone()
            }),
        }
    }
}

pub struct PunchWorkflow {
    inner: Arc<Mutex<Inner>>,
    deps: WorkflowDeps,
    settings: WorkflowSettings,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().expect("punch workflow state poisoned")
}

impl PunchWorkflow {
    /// Starts a wizard instance, loading the roster once.
    pub async fn activate(deps: WorkflowDeps, settings: WorkflowSettings) -> Self {
        let (roster, advisory) = match deps.roster.list_employees().await {
            Ok(employees) => (employees.into_iter().filter(|e| e.active).collect(), None),
            Err(e) => {
                warn!(error = %e, "Failed to load roster for the time clock");
                (Vec::new(), Some(Advisory::error("Employee list unavailable. Reload to try again.")))
            }
        };

        let inner = Inner {
            stage: Stage::SelectDirection,
            generation: 0,
            roster,
            direction: None,
            employee: None,
            camera: None,
            camera_status: CameraStatus::Idle,
            location: None,
            location_status: LocationStatus::Idle,
            submitting: false,
            advisory,
            last_punch: None,
            acquisitions: Vec::new(),
            reset_timer: None,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            deps,
            settings,
        }
    }

    pub fn view(&self) -> WorkflowView {
        lock(&self.inner).view()
    }

    /// Active employees whose name or job title contains `search`.
    pub fn roster(&self, search: &str) -> Vec<Employee> {
        let inner = lock(&self.inner);
        filter_roster(&inner.roster, search).into_iter().cloned().collect()
    }

    pub fn select_direction(&self, direction: PunchDirection) -> Result<WorkflowView, WorkflowError> {
        let mut inner = lock(&self.inner);
        inner.expect_stage(Stage::SelectDirection, "choose a direction")?;

        inner.direction = Some(direction);
        inner.stage = Stage::SelectEmployee;
        inner.advisory = None;
        debug!(%direction, "Punch direction selected");
        Ok(inner.view())
    }

    pub fn select_employee(&self, employee_id: &str) -> Result<WorkflowView, WorkflowError> {
        let mut inner = lock(&self.inner);
        inner.expect_stage(Stage::SelectEmployee, "select an employee")?;

        let employee = inner
            .roster
            .iter()
            .find(|e| e.id == employee_id)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownEmployee(employee_id.to_string()))?;

        info!(employee_id = %employee.id, "Employee selected, starting capture");
        inner.employee = Some(employee);
        inner.stage = Stage::Capturing;
        inner.camera_status = CameraStatus::Starting;
        inner.location = None;
        inner.location_status = LocationStatus::Locating;
        inner.advisory = None;

        let generation = inner.generation;
        let camera_task = tokio::spawn(acquire_camera(
            self.inner.clone(),
            self.deps.camera.clone(),
            self.settings.stream_request,
            generation,
        ));
        let location_task = tokio::spawn(acquire_location(
            self.inner.clone(),
            self.deps.geolocation.clone(),
            generation,
        ));

        inner.acquisitions.retain(|task| !task.is_finished());
        inner.acquisitions.push(camera_task);
        inner.acquisitions.push(location_task);
        Ok(inner.view())
    }

    /// Captures one frame and submits it. Never propagates an error: every
    /// failure ends up as an advisory on the view.
    pub async fn confirm_capture(&self) -> ConfirmOutcome {
        let (submission, generation) = {
            let mut guard = lock(&self.inner);
            let inner = &mut *guard;

            if inner.submitting {
                return ConfirmOutcome::Ignored(IgnoredReason::SubmissionInFlight);
            }
            if inner.stage != Stage::Capturing {
                return ConfirmOutcome::Ignored(IgnoredReason::NotCapturing);
            }
            let Some(lease) = inner.camera.as_ref() else {
                return ConfirmOutcome::Ignored(IgnoredReason::NoStream);
            };

            let frame = if lease.stream().ready_state() < ReadyState::HaveCurrentData {
                None
            } else {
                lease.stream().grab_frame()
            };
            let Some(frame) = frame else {
                inner.advisory = Some(Advisory::info("Waiting for the camera signal. Try again in a moment."));
                return ConfirmOutcome::AwaitingFrame;
            };

            let employee_id = inner.employee.as_ref().map(|e| e.id.clone());
            let (Some(employee_id), Some(direction)) = (employee_id, inner.direction) else {
                inner.advisory = Some(Advisory::error("Time clock is not initialised. Cancel and start again."));
                return ConfirmOutcome::Ignored(IgnoredReason::NotCapturing);
            };

            let submission = PunchSubmission::new(
                employee_id,
                frame.mirrored().to_data_url(),
                direction,
                inner.location,
            );

            inner.submitting = true;
            inner.stage = Stage::Submitting;
            inner.advisory = Some(Advisory::info("Registering punch and location..."));
            (submission, inner.generation)
        };

        let employee_id = submission.employee_id.clone();
        let result = self.deps.registration.submit(submission).await;

        let mut guard = lock(&self.inner);
        let inner = &mut *guard;
        inner.submitting = false;

        if inner.generation != generation {
            // cancelled while the call was in flight; the backend may still
            // have recorded the punch, but the wizard has moved on
            return match result {
                Ok(event) => {
                    info!(punch_id = %event.id, employee_id = %employee_id, "Punch recorded after the wizard was cancelled");
                    ConfirmOutcome::Recorded(event)
                }
                Err(e) => ConfirmOutcome::Failed(e.to_string()),
            };
        }

        match result {
            Ok(event) => {
                inner.camera = None;
                inner.camera_status = CameraStatus::Idle;
                inner.stage = Stage::Completed;

                let name = inner.employee.as_ref().map(|e| e.name.clone()).unwrap_or_else(|| employee_id.clone());
                inner.advisory = Some(Advisory::success(format!(
                    "{} recorded for {} at {}",
                    event.direction,
                    name,
                    event.recorded_at.format("%H:%M:%S")
                )));
                inner.last_punch = Some(event.clone());
                info!(punch_id = %event.id, employee_id = %employee_id, direction = %event.direction, "Punch recorded");

                let state = self.inner.clone();
                let delay = self.settings.display_delay;
                inner.reset_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let mut inner = lock(&state);
                    if inner.generation == generation && inner.stage == Stage::Completed {
                        inner.reset();
                        debug!("Time clock reset after displaying the punch");
                    }
                }));

                ConfirmOutcome::Recorded(event)
            }
            Err(e) => {
                warn!(error = %e, employee_id = %employee_id, "Punch registration failed");
                inner.stage = Stage::Capturing;
                inner.advisory = Some(Advisory::error("Punch registration failed. Please try again."));
                ConfirmOutcome::Failed(e.to_string())
            }
        }
    }

    /// Back to the first step, releasing the camera. Idempotent.
    pub fn cancel(&self) -> WorkflowView {
        let mut inner = lock(&self.inner);
        if inner.stage != Stage::SelectDirection {
            info!(stage = %inner.stage, "Time clock cancelled");
        }
        inner.reset();
        inner.view()
    }

    /// Releases everything; called when the owner goes away.
    pub fn teardown(&self) {
        let mut inner = lock(&self.inner);
        inner.reset();
        // pending acquisitions see the bumped generation and release what they get
        inner.acquisitions.clear();
    }

    #[cfg(test)]
    pub(crate) async fn settle(&self) {
        let tasks: Vec<_> = lock(&self.inner).acquisitions.drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }
    }
}

impl Drop for PunchWorkflow {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn acquire_camera(
    state: Arc<Mutex<Inner>>,
    camera: Arc<dyn CameraCapture>,
    request: StreamRequest,
    generation: u64,
) {
    let result = camera.acquire_stream(request).await;
    let mut inner = lock(&state);

    if inner.generation != generation {
        if let Ok(stream) = result {
            debug!(stream_id = stream.id(), "Camera arrived after cancel, releasing");
            drop(CameraLease::new(camera, stream));
        }
        return;
    }

    match result {
        Ok(stream) => {
            debug!(stream_id = stream.id(), "Camera stream live");
            inner.camera = Some(CameraLease::new(camera, stream));
            inner.camera_status = CameraStatus::Live;
        }
        Err(e) => {
            warn!(error = %e, "Camera unavailable");
            inner.camera_status = CameraStatus::Failed {
                reason: format!(
                    "Could not access the camera ({e}). Check the browser permission and that the page is served over HTTPS."
                ),
            };
            inner.advisory = Some(Advisory::error("Camera unavailable."));
        }
    }
}

async fn acquire_location(state: Arc<Mutex<Inner>>, geolocation: Arc<dyn Geolocation>, generation: u64) {
    let result = geolocation.current_position().await;
    let mut inner = lock(&state);

    if inner.generation != generation {
        return;
    }

    match result {
        Ok(point) => {
            inner.location = Some(point);
            inner.location_status = LocationStatus::Acquired {
                latitude: point.latitude,
                longitude: point.longitude,
            };
        }
        Err(e) => {
            warn!(error = %e, "Location unavailable, punch will carry no coordinates");
            inner.location_status = LocationStatus::Unavailable {
                reason: format!("Location not detected ({e}). The punch will be recorded without coordinates."),
            };
        }
    }
}
