use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use validator::{Validate, ValidationError};

use crate::error::{Result, TrackerError};
use crate::tracking::acquisition::AcquisitionPolicy;

/// Thresholds and timings of the tracking engine.
///
/// The stats filter (`movement_threshold`) and the route filters
/// (`route_min_spacing`, `route_max_accuracy`) are independent.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct TrackingConfig {
    /// Minimum displacement in meters for a fix to count towards stats.
    #[validate(range(min = 0.0))]
    pub movement_threshold: f64,
    /// Minimum spacing in meters between stored route points.
    #[validate(range(min = 0.0))]
    pub route_min_spacing: f64,
    /// Worst accuracy in meters a fix may report and still be stored on the route.
    #[validate(range(exclusive_min = 0.0))]
    pub route_max_accuracy: f64,
    /// Below this speed (m/s) the instantaneous pace is reported as absent.
    #[validate(range(min = 0.0))]
    pub min_pace_speed: f64,
    #[validate(range(exclusive_min = 0.0, max = 500.0))]
    pub body_weight_kg: f64,
    #[validate(custom(function = "non_zero_duration"))]
    pub tick_interval: Duration,
    /// Without an accepted fix for this long, a tick drops the instantaneous speed to zero.
    #[validate(custom(function = "non_zero_duration"))]
    pub stale_speed_after: Duration,
    #[validate(nested)]
    pub acquisition: AcquisitionPolicy,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            movement_threshold: 2.0,
            route_min_spacing: 5.0,
            route_max_accuracy: 20.0,
            min_pace_speed: 0.5,
            body_weight_kg: 70.0,
            tick_interval: Duration::from_secs(1),
            stale_speed_after: Duration::from_secs(5),
            acquisition: AcquisitionPolicy::default(),
        }
    }
}

impl TrackingConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let acquisition = AcquisitionPolicy {
            attempts: env_or("TRACKER_FIX_ATTEMPTS", defaults.acquisition.attempts)?,
            attempt_timeout: Duration::from_secs(env_or(
                "TRACKER_FIX_TIMEOUT_SECS",
                defaults.acquisition.attempt_timeout.as_secs(),
            )?),
            retry_delay: Duration::from_secs(env_or(
                "TRACKER_FIX_RETRY_DELAY_SECS",
                defaults.acquisition.retry_delay.as_secs(),
            )?),
        };

        let config = Self {
            movement_threshold: env_or("TRACKER_MOVEMENT_THRESHOLD_M", defaults.movement_threshold)?,
            route_min_spacing: env_or("TRACKER_ROUTE_MIN_SPACING_M", defaults.route_min_spacing)?,
            route_max_accuracy: env_or("TRACKER_ROUTE_MAX_ACCURACY_M", defaults.route_max_accuracy)?,
            min_pace_speed: env_or("TRACKER_MIN_PACE_SPEED_MPS", defaults.min_pace_speed)?,
            body_weight_kg: env_or("TRACKER_BODY_WEIGHT_KG", defaults.body_weight_kg)?,
            tick_interval: defaults.tick_interval,
            stale_speed_after: Duration::from_secs(env_or(
                "TRACKER_STALE_SPEED_SECS",
                defaults.stale_speed_after.as_secs(),
            )?),
            acquisition,
        };

        config.checked()
    }

    /// Run validation, turning failures into a configuration error.
    pub fn checked(self) -> Result<Self> {
        self.validate()
            .map_err(|e| TrackerError::config(e.to_string()))?;
        Ok(self)
    }
}

/// Process-level settings for the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub sessions_dir: PathBuf,
    pub tracking: TrackingConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            host: env::var("TRACKER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("TRACKER_PORT", 8080)?,
            sessions_dir: env::var("TRACKER_SESSIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("sessions")),
            tracking: TrackingConfig::from_env()?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| TrackerError::config(format!("{}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

pub(crate) fn non_zero_duration(value: &Duration) -> std::result::Result<(), ValidationError> {
    if value.is_zero() {
        return Err(ValidationError::new("zero_duration"));
    }
    Ok(())
}
