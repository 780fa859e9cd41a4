use std::collections::BTreeMap;

use models::{ActivitiesAggregation, SummaryResponse};

use crate::tracking::models::ActivitySession;

pub mod models;

/// Group completed sessions by activity kind and summarize each group.
pub fn aggregate_sessions(sessions: &[ActivitySession]) -> BTreeMap<String, ActivitiesAggregation> {
    let mut by_kind: BTreeMap<String, Vec<&ActivitySession>> = BTreeMap::new();

    for session in sessions {
        by_kind
            .entry(session.kind.to_string())
            .or_default()
            .push(session);
    }

    by_kind
        .into_iter()
        .map(|(kind, group)| (kind, aggregate_group(&group)))
        .collect()
}

pub fn summarize(sessions: &[ActivitySession]) -> SummaryResponse {
    SummaryResponse {
        total_activities: sessions.len() as u32,
        by_kind: aggregate_sessions(sessions),
    }
}

fn aggregate_group(sessions: &[&ActivitySession]) -> ActivitiesAggregation {
    let total_distance: f64 = sessions.iter().map(|s| s.stats.distance).sum();
    let total_active_secs: f64 = sessions.iter().map(|s| s.stats.active.as_secs_f64()).sum();

    let average_pace = if total_distance > 0.0 {
        Some(total_active_secs / (total_distance / 1000.0))
    } else {
        None
    };

    let best_pace = sessions
        .iter()
        .filter_map(|s| s.stats.average_pace)
        .fold(None, |best: Option<f64>, pace| {
            Some(best.map_or(pace, |b| b.min(pace)))
        });

    ActivitiesAggregation {
        total_activities: sessions.len() as u32,
        total_distance,
        total_active_secs,
        average_pace,
        best_pace,
        best_distance: sessions
            .iter()
            .map(|s| s.stats.distance)
            .fold(0.0, f64::max),
        total_elevation_gain: sessions.iter().map(|s| s.stats.elevation_gain).sum(),
        total_calories: sessions
            .iter()
            .fold(0u64, |total, s| total.saturating_add(u64::from(s.stats.calories))),
        total_steps: sessions
            .iter()
            .fold(0u64, |total, s| total.saturating_add(s.stats.steps)),
    }
}
