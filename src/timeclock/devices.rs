//! Collaborators of the punch workflow: device access, the roster and the
//! registration backend.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::frame::Frame;
use crate::model::{
    employee::Employee,
    punch::{GeoPoint, PunchEvent, PunchSubmission},
};
use crate::store::{DataApi, StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    User,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl StreamRequest {
    /// Front camera at 720p, what a wall-mounted kiosk asks for.
    pub const KIOSK: StreamRequest = StreamRequest {
        facing: Facing::User,
        ideal_width: 1280,
        ideal_height: 720,
    };
}

/// How much video a stream has buffered, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera not supported on this device")]
    Unsupported,
    #[error("camera device error: {0}")]
    DeviceError(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("geolocation not supported on this device")]
    Unsupported,
    #[error("location request timed out")]
    Timeout,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("punch rejected: {0}")]
    Rejected(String),
}

/// A live video stream handed out by a [`CameraCapture`].
pub trait VideoStream: Send + Sync {
    fn id(&self) -> &str;
    fn ready_state(&self) -> ReadyState;
    /// Current frame as shown in the preview (not mirrored).
    fn grab_frame(&self) -> Option<Frame>;
    /// Stops every track of the stream. Must be idempotent.
    fn stop(&mut self);
}

#[async_trait]
pub trait CameraCapture: Send + Sync {
    async fn acquire_stream(&self, request: StreamRequest) -> Result<Box<dyn VideoStream>, CameraError>;

    fn stop_stream(&self, stream: &mut dyn VideoStream) {
        stream.stop();
    }
}

#[async_trait]
pub trait Geolocation: Send + Sync {
    async fn current_position(&self) -> Result<GeoPoint, GeolocationError>;
}

#[async_trait]
pub trait PunchRegistration: Send + Sync {
    async fn submit(&self, submission: PunchSubmission) -> Result<PunchEvent, RegistrationError>;
}

#[async_trait]
pub trait EmployeeRoster: Send + Sync {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;
}

/// Exclusive hold on a camera stream; dropping it stops the stream.
pub struct CameraLease {
    camera: Arc<dyn CameraCapture>,
    stream: Box<dyn VideoStream>,
}

impl CameraLease {
    pub fn new(camera: Arc<dyn CameraCapture>, stream: Box<dyn VideoStream>) -> Self {
        Self { camera, stream }
    }

    pub fn stream(&self) -> &dyn VideoStream {
        self.stream.as_ref()
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        tracing::debug!(stream_id = self.stream.id(), "Releasing camera stream");
        self.camera.stop_stream(self.stream.as_mut());
    }
}

/// Serves the roster and punch registration from the data API.
#[derive(Clone)]
pub struct ApiBackend(pub Arc<dyn DataApi>);

#[async_trait]
impl EmployeeRoster for ApiBackend {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        self.0.list_employees().await
    }
}

#[async_trait]
impl PunchRegistration for ApiBackend {
    async fn submit(&self, submission: PunchSubmission) -> Result<PunchEvent, RegistrationError> {
        self.0.register_punch(submission).await.map_err(|e| match e {
            StoreError::NotFound(_) | StoreError::Inactive(_) => RegistrationError::Rejected(e.to_string()),
            StoreError::Validation(_) => RegistrationError::Server(e.to_string()),
            StoreError::Unavailable(_) => RegistrationError::Network(e.to_string()),
        })
    }
}
