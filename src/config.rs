use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;

use crate::model::punch::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Simulated,
    Disabled,
}

impl FromStr for CameraMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "simulated" => Ok(CameraMode::Simulated),
            "disabled" => Ok(CameraMode::Disabled),
            other => bail!("unknown camera mode {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    pub inactivity_timeout: Duration,
    pub punch_reset_delay: Duration,

    // Kiosk sessions
    pub kiosk_session_idle: Duration,
    pub kiosk_max_sessions: u64,

    // Devices
    pub camera_mode: CameraMode,
    pub camera_width: u32,
    pub camera_height: u32,
    pub camera_warmup: Duration,
    pub kiosk_position: Option<GeoPoint>,

    // In-memory backend
    pub mock_latency: Duration,
    pub punch_processing: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));

        fn parsed<T, F>(lookup: &F, key: &str, default: &str) -> Result<T>
        where
            T: FromStr,
            T::Err: std::fmt::Display,
            F: Fn(&str) -> Option<String>,
        {
            let raw = lookup(key).unwrap_or_else(|| default.to_string());
            raw.trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}"))
        }

        let millis = |key: &str, default: &str| parsed::<u64, _>(&lookup, key, default).map(Duration::from_millis);
        let secs = |key: &str, default: &str| parsed::<u64, _>(&lookup, key, default).map(Duration::from_secs);

        let latitude = lookup("KIOSK_LATITUDE").map(|v| v.trim().parse::<f64>());
        let longitude = lookup("KIOSK_LONGITUDE").map(|v| v.trim().parse::<f64>());
        let kiosk_position = match (latitude, longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint {
                latitude: lat.context("invalid KIOSK_LATITUDE")?,
                longitude: lng.context("invalid KIOSK_LONGITUDE")?,
            }),
            (None, None) => None,
            _ => bail!("KIOSK_LATITUDE and KIOSK_LONGITUDE must be set together"),
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed(&lookup, "ACCESS_TOKEN_TTL", "900")?, // default 15 min

            rate_login_per_min: parsed(&lookup, "RATE_LOGIN_PER_MIN", "60")?,
            rate_protected_per_min: parsed(&lookup, "RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),

            inactivity_timeout: secs("INACTIVITY_TIMEOUT_SECS", "900")?,
            punch_reset_delay: millis("PUNCH_RESET_DELAY_MS", "4000")?,

            kiosk_session_idle: secs("KIOSK_SESSION_IDLE_SECS", "600")?,
            kiosk_max_sessions: parsed(&lookup, "KIOSK_MAX_SESSIONS", "64")?,

            camera_mode: parsed(&lookup, "CAMERA_MODE", "simulated")?,
            camera_width: parsed(&lookup, "CAMERA_WIDTH", "320")?,
            camera_height: parsed(&lookup, "CAMERA_HEIGHT", "240")?,
            camera_warmup: millis("CAMERA_WARMUP_MS", "300")?,
            kiosk_position,

            mock_latency: millis("MOCK_LATENCY_MS", "0")?,
            punch_processing: millis("PUNCH_PROCESSING_MS", "1500")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [("SERVER_ADDR", "127.0.0.1:8080"), ("JWT_SECRET", "secret")];

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&REQUIRED).unwrap();
        assert_eq!(config.access_token_ttl, 900);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.inactivity_timeout, Duration::from_secs(900));
        assert_eq!(config.punch_reset_delay, Duration::from_millis(4000));
        assert_eq!(config.camera_mode, CameraMode::Simulated);
        assert_eq!((config.camera_width, config.camera_height), (320, 240));
        assert!(config.kiosk_position.is_none());
        assert_eq!(config.punch_processing, Duration::from_millis(1500));
    }

    #[test]
    fn required_keys_are_reported() {
        let err = config(&[("SERVER_ADDR", "127.0.0.1:8080")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn malformed_values_are_errors() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("KIOSK_MAX_SESSIONS", "many"));
        assert!(config(&vars).unwrap_err().to_string().contains("KIOSK_MAX_SESSIONS"));

        let mut vars = REQUIRED.to_vec();
        vars.push(("CAMERA_MODE", "infrared"));
        assert!(config(&vars).is_err());
    }

    #[test]
    fn kiosk_position_needs_both_coordinates() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("KIOSK_LATITUDE", "-8.8383"));
        assert!(config(&vars).is_err());

        vars.push(("KIOSK_LONGITUDE", "13.2344"));
        let position = config(&vars).unwrap().kiosk_position.unwrap();
        assert_eq!(position.latitude, -8.8383);
        assert_eq!(position.longitude, 13.2344);
    }
}
