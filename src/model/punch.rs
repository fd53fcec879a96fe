use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PunchDirection {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PunchMethod {
    Facial,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = -8.8383)]
    pub latitude: f64,
    #[schema(example = 13.2344)]
    pub longitude: f64,
}

/// One recorded attendance action. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PunchEvent {
    #[schema(example = "mov-5f0c3a")]
    pub id: String,

    #[schema(example = "c1")]
    pub employee_id: String,

    #[schema(example = "2026-01-01T08:00:00Z", format = "date-time", value_type = String)]
    pub recorded_at: DateTime<Utc>,

    pub direction: PunchDirection,

    pub method: PunchMethod,

    /// Opaque 0–1 score attached by the registration backend.
    #[schema(example = 0.96, nullable = true)]
    pub confidence_score: Option<f64>,

    #[schema(nullable = true)]
    pub captured_image: Option<String>,

    #[schema(example = -8.8383, nullable = true)]
    pub latitude: Option<f64>,

    #[schema(example = 13.2344, nullable = true)]
    pub longitude: Option<f64>,
}

impl PunchEvent {
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// What the capture step hands to the registration backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PunchSubmission {
    #[schema(example = "c1")]
    pub employee_id: String,
    /// Encoded still image (data URL).
    pub image: String,
    pub direction: PunchDirection,
    #[schema(example = -8.8383, nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 13.2344, nullable = true)]
    pub longitude: Option<f64>,
}

impl PunchSubmission {
    pub fn new(
        employee_id: impl Into<String>,
        image: String,
        direction: PunchDirection,
        location: Option<GeoPoint>,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            image,
            direction,
            latitude: location.map(|p| p.latitude),
            longitude: location.map(|p| p.longitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn direction_uses_wire_names() {
        assert_eq!(PunchDirection::CheckIn.to_string(), "CHECK_IN");
        assert_eq!(PunchDirection::from_str("CHECK_OUT").unwrap(), PunchDirection::CheckOut);
        assert_eq!(
            serde_json::to_value(PunchMethod::Facial).unwrap(),
            serde_json::json!("FACIAL")
        );
    }

    #[test]
    fn submission_without_location_omits_both_coordinates() {
        let s = PunchSubmission::new("c1", "data:".into(), PunchDirection::CheckIn, None);
        assert!(s.latitude.is_none() && s.longitude.is_none());

        let s = PunchSubmission::new(
            "c1",
            "data:".into(),
            PunchDirection::CheckIn,
            Some(GeoPoint { latitude: 1.5, longitude: -2.0 }),
        );
        assert_eq!((s.latitude, s.longitude), (Some(1.5), Some(-2.0)));
    }
}
