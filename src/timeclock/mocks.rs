//! Recording doubles for the workflow's collaborators.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use super::devices::{
    CameraCapture, CameraError, EmployeeRoster, Geolocation, GeolocationError, PunchRegistration, ReadyState,
    RegistrationError, StreamRequest, VideoStream,
};
use super::frame::Frame;
use crate::model::{
    employee::Employee,
    punch::{GeoPoint, PunchEvent, PunchMethod, PunchSubmission},
};
use crate::store::StoreResult;

pub struct MockCamera {
    outcome: Result<ReadyState, CameraError>,
    delay: Duration,
    attempts: AtomicUsize,
    active: Arc<AtomicUsize>,
}

impl MockCamera {
    fn with(outcome: Result<ReadyState, CameraError>, delay: Duration) -> Self {
        Self {
            outcome,
            delay,
            attempts: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::with(Ok(ReadyState::HaveEnoughData), Duration::ZERO)
    }

    /// Hands out streams that never get past metadata.
    pub fn buffering() -> Self {
        Self::with(Ok(ReadyState::HaveMetadata), Duration::ZERO)
    }

    pub fn slow(delay: Duration) -> Self {
        Self::with(Ok(ReadyState::HaveEnoughData), delay)
    }

    pub fn failing(error: CameraError) -> Self {
        Self::with(Err(error), Duration::ZERO)
    }

    /// The frame every working stream returns.
    pub fn frame() -> Frame {
        #[rustfmt::skip]
        let pixels = vec![
            10, 20, 30,   40, 50, 60,
            70, 80, 90,   100, 110, 120,
        ];
        Frame { width: 2, height: 2, pixels }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Streams handed out and not yet stopped.
    pub fn active_streams(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraCapture for MockCamera {
    async fn acquire_stream(&self, _request: StreamRequest) -> Result<Box<dyn VideoStream>, CameraError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let ready = self.outcome.clone()?;
        self.active.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            id: format!("mock-{attempt}"),
            ready,
            active: self.active.clone(),
            stopped: false,
        }))
    }
}

struct MockStream {
    id: String,
    ready: ReadyState,
    active: Arc<AtomicUsize>,
    stopped: bool,
}

impl VideoStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn ready_state(&self) -> ReadyState {
        if self.stopped { ReadyState::HaveNothing } else { self.ready }
    }

    fn grab_frame(&self) -> Option<Frame> {
        (self.ready_state() >= ReadyState::HaveCurrentData).then(MockCamera::frame)
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

pub struct MockGeolocation {
    outcome: Result<GeoPoint, GeolocationError>,
    attempts: AtomicUsize,
}

impl MockGeolocation {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            outcome: Ok(GeoPoint { latitude, longitude }),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: GeolocationError) -> Self {
        Self {
            outcome: Err(error),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geolocation for MockGeolocation {
    async fn current_position(&self) -> Result<GeoPoint, GeolocationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

pub struct MockRegistration {
    calls: AtomicUsize,
    failing: AtomicBool,
    gate: Option<Notify>,
    submissions: Mutex<Vec<PunchSubmission>>,
}

impl MockRegistration {
    fn build(failing: bool, gate: Option<Notify>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(failing),
            gate,
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::build(false, None)
    }

    pub fn failing() -> Self {
        Self::build(true, None)
    }

    /// Every submit blocks until [`MockRegistration::release`] is called.
    pub fn gated() -> Self {
        Self::build(false, Some(Notify::new()))
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_submission(&self) -> Option<PunchSubmission> {
        self.submissions.lock().expect("submissions lock poisoned").last().cloned()
    }
}

#[async_trait]
impl PunchRegistration for MockRegistration {
    async fn submit(&self, submission: PunchSubmission) -> Result<PunchEvent, RegistrationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.submissions
            .lock()
            .expect("submissions lock poisoned")
            .push(submission.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RegistrationError::Network("connection reset".into()));
        }

        Ok(PunchEvent {
            id: format!("mov-{call}"),
            employee_id: submission.employee_id,
            recorded_at: Utc::now(),
            direction: submission.direction,
            method: PunchMethod::Facial,
            confidence_score: Some(0.97),
            captured_image: Some(submission.image),
            latitude: submission.latitude,
            longitude: submission.longitude,
        })
    }
}

pub struct MockRoster(pub Vec<Employee>);

#[async_trait]
impl EmployeeRoster for MockRoster {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.0.clone())
    }
}
