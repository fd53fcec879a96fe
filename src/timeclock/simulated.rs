//! Device adapters used when the service runs without real hardware.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use super::devices::{CameraCapture, CameraError, Geolocation, GeolocationError, ReadyState, StreamRequest, VideoStream};
use super::frame::Frame;
use crate::model::punch::GeoPoint;

/// Camera that renders a synthetic gradient. Frames only become available
/// once the warm-up has elapsed, like a real sensor negotiating exposure.
pub struct SimulatedCamera {
    max_width: u32,
    max_height: u32,
    warmup: Duration,
    enabled: bool,
}

impl SimulatedCamera {
    pub fn new(max_width: u32, max_height: u32, warmup: Duration) -> Self {
        Self {
            max_width,
            max_height,
            warmup,
            enabled: true,
        }
    }

    /// A kiosk without a camera: every acquisition fails as unsupported.
    pub fn disabled() -> Self {
        Self {
            max_width: 0,
            max_height: 0,
            warmup: Duration::ZERO,
            enabled: false,
        }
    }
}

#[async_trait]
impl CameraCapture for SimulatedCamera {
    async fn acquire_stream(&self, request: StreamRequest) -> Result<Box<dyn VideoStream>, CameraError> {
        if !self.enabled {
            return Err(CameraError::Unsupported);
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(CameraError::DeviceError("sensor reports no resolution".into()));
        }

        let width = request.ideal_width.clamp(1, self.max_width);
        let height = request.ideal_height.clamp(1, self.max_height);
        let stream = SimulatedStream {
            id: Uuid::new_v4().to_string(),
            width,
            height,
            started: Instant::now(),
            warmup: self.warmup,
            live: true,
        };
        tracing::debug!(stream_id = %stream.id, width, height, facing = ?request.facing, "Simulated camera started");
        Ok(Box::new(stream))
    }
}

struct SimulatedStream {
    id: String,
    width: u32,
    height: u32,
    started: Instant,
    warmup: Duration,
    live: bool,
}

impl VideoStream for SimulatedStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn ready_state(&self) -> ReadyState {
        if !self.live {
            ReadyState::HaveNothing
        } else if self.started.elapsed() < self.warmup {
            ReadyState::HaveMetadata
        } else {
            ReadyState::HaveEnoughData
        }
    }

    fn grab_frame(&self) -> Option<Frame> {
        if self.ready_state() < ReadyState::HaveCurrentData {
            return None;
        }

        let (w, h) = (self.width as usize, self.height as usize);
        let tick = (self.started.elapsed().as_millis() / 40 % 256) as u8;
        let mut pixels = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                pixels.push((x * 255 / w.max(1)) as u8);
                pixels.push((y * 255 / h.max(1)) as u8);
                pixels.push(tick);
            }
        }
        Frame::new(self.width, self.height, pixels)
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            tracing::debug!(stream_id = %self.id, "Simulated camera stopped");
        }
    }
}

/// Reports the configured kiosk position, or no support when none is set.
pub struct FixedGeolocation {
    position: Option<GeoPoint>,
}

impl FixedGeolocation {
    pub fn new(position: Option<GeoPoint>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocation for FixedGeolocation {
    async fn current_position(&self) -> Result<GeoPoint, GeolocationError> {
        self.position.ok_or(GeolocationError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn frames_appear_after_warmup() {
        let camera = SimulatedCamera::new(8, 6, Duration::from_millis(300));
        let mut stream = camera.acquire_stream(StreamRequest::KIOSK).await.unwrap();

        assert_eq!(stream.ready_state(), ReadyState::HaveMetadata);
        assert!(stream.grab_frame().is_none());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let frame = stream.grab_frame().unwrap();
        // clamped to the sensor's resolution
        assert_eq!((frame.width, frame.height), (8, 6));

        stream.stop();
        assert_eq!(stream.ready_state(), ReadyState::HaveNothing);
        assert!(stream.grab_frame().is_none());
    }

    #[tokio::test]
    async fn disabled_camera_is_unsupported() {
        let result = SimulatedCamera::disabled().acquire_stream(StreamRequest::KIOSK).await;
        assert!(matches!(result, Err(CameraError::Unsupported)));
    }

    #[tokio::test]
    async fn geolocation_without_position_is_unsupported() {
        assert_eq!(
            FixedGeolocation::new(None).current_position().await,
            Err(GeolocationError::Unsupported)
        );
        let here = GeoPoint { latitude: -8.83, longitude: 13.23 };
        assert_eq!(FixedGeolocation::new(Some(here)).current_position().await, Ok(here));
    }
}
