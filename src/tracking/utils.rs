use std::time::Duration;

use chrono::{DateTime, Utc};

use super::models::Coordinate;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters.
pub fn haversine_distance(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Seconds per kilometer for a speed above `min_speed`, `None` otherwise.
pub fn pace_from_speed(speed: f64, min_speed: f64) -> Option<f64> {
    if speed > min_speed && speed > 0.0 {
        Some(1000.0 / speed)
    } else {
        None
    }
}

/// Non-negative span between two instants; an earlier `to` yields zero.
pub fn span(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or_default()
}

/// Format a pace in seconds per kilometer as `m:ss`.
pub fn format_pace(pace: Option<f64>) -> String {
    match pace {
        Some(secs) if secs.is_finite() => {
            let total = secs.round() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => "--:--".to_string(),
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
