use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ActivitiesAggregation {
    pub total_activities: u32,
    /// Meters.
    pub total_distance: f64,
    pub total_active_secs: f64,
    /// Seconds per kilometer over all sessions combined.
    pub average_pace: Option<f64>,
    /// Fastest per-session average pace.
    pub best_pace: Option<f64>,
    pub best_distance: f64,
    pub total_elevation_gain: f64,
    pub total_calories: u64,
    pub total_steps: u64,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SummaryResponse {
    pub total_activities: u32,
    pub by_kind: std::collections::BTreeMap<String, ActivitiesAggregation>,
}
