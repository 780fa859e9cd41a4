use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One reported position sample, produced by the host platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PositionFix {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Horizontal accuracy radius in meters.
    #[validate(range(min = 0.0))]
    pub accuracy: f64,
    pub altitude: Option<f64>,
    pub heading: Option<f64>,
    /// Ground speed in m/s as reported by the receiver.
    pub speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            altitude: None,
            heading: None,
            speed: None,
            timestamp,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A lat/lng pair on the recorded route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Running,
    Walking,
    Cycling,
    Hiking,
}

impl ActivityKind {
    /// Metabolic equivalent used by the calorie estimate.
    pub fn met(self) -> f64 {
        match self {
            ActivityKind::Running => 9.8,
            ActivityKind::Walking => 3.8,
            ActivityKind::Cycling => 7.5,
            ActivityKind::Hiking => 6.0,
        }
    }

    /// Meters covered per step; zero disables step estimation.
    pub fn step_length(self) -> f64 {
        match self {
            ActivityKind::Running => 1.0,
            ActivityKind::Walking => 0.75,
            ActivityKind::Cycling => 0.0,
            ActivityKind::Hiking => 0.7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Running => "running",
            ActivityKind::Walking => "walking",
            ActivityKind::Cycling => "cycling",
            ActivityKind::Hiking => "hiking",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" | "run" => Ok(ActivityKind::Running),
            "walking" | "walk" => Ok(ActivityKind::Walking),
            "cycling" | "ride" | "bike" => Ok(ActivityKind::Cycling),
            "hiking" | "hike" => Ok(ActivityKind::Hiking),
            other => Err(format!("Unknown activity kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityState {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

impl std::fmt::Display for ActivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActivityState::Idle => "idle",
            ActivityState::Running => "running",
            ActivityState::Paused => "paused",
            ActivityState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Working statistics of a session. Copies taken into waypoints and the
/// final record are never touched again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FitnessStats {
    /// Cumulative distance in meters.
    pub distance: f64,
    #[schema(value_type = Object)]
    pub elapsed: Duration,
    #[schema(value_type = Object)]
    pub active: Duration,
    #[schema(value_type = Object)]
    pub paused: Duration,
    /// m/s over active time.
    pub average_speed: f64,
    pub current_speed: f64,
    pub max_speed: f64,
    /// Seconds per kilometer, `None` when there is no meaningful pace.
    pub average_pace: Option<f64>,
    pub current_pace: Option<f64>,
    pub calories: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub steps: u64,
    /// Sum of positive altitude deltas in meters.
    pub elevation_gain: f64,
}

impl FitnessStats {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            distance: 0.0,
            elapsed: Duration::ZERO,
            active: Duration::ZERO,
            paused: Duration::ZERO,
            average_speed: 0.0,
            current_speed: 0.0,
            max_speed: 0.0,
            average_pace: None,
            current_pace: None,
            calories: 0,
            start_time,
            end_time: None,
            steps: 0,
            elevation_gain: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WaypointKind {
    Start,
    Pause,
    Resume,
    Finish,
    /// Not emitted by the engine yet.
    Milestone,
}

/// A lifecycle marker on the session timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Waypoint {
    pub position: Coordinate,
    pub timestamp: DateTime<Utc>,
    pub kind: WaypointKind,
    pub note: Option<String>,
    pub stats: Option<FitnessStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivitySession {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub state: ActivityState,
    pub stats: FitnessStats,
    pub route: Vec<Coordinate>,
    pub waypoints: Vec<Waypoint>,
    pub metadata: BTreeMap<String, String>,
}

impl ActivitySession {
    pub fn new(kind: ActivityKind, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            state: ActivityState::Running,
            stats: FitnessStats::new(start_time),
            route: Vec::new(),
            waypoints: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}
