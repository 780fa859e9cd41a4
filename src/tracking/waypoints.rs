use chrono::{DateTime, Utc};

use super::models::{Coordinate, FitnessStats, Waypoint, WaypointKind};

/// Append a waypoint to a session timeline and return a copy of it.
///
/// Existing entries are never modified or removed.
pub fn record(
    waypoints: &mut Vec<Waypoint>,
    kind: WaypointKind,
    position: Coordinate,
    timestamp: DateTime<Utc>,
    stats: Option<FitnessStats>,
) -> Waypoint {
    let waypoint = Waypoint {
        position,
        timestamp,
        kind,
        note: None,
        stats,
    };
    waypoints.push(waypoint.clone());
    waypoint
}

/// Check the lifecycle shape of a finished timeline: exactly one leading
/// `start`, exactly one trailing `finish`, and pause/resume strictly
/// alternating (a final pause without resume is allowed).
pub fn validate_timeline(waypoints: &[Waypoint]) -> Result<(), String> {
    let lifecycle: Vec<&Waypoint> = waypoints
        .iter()
        .filter(|w| w.kind != WaypointKind::Milestone)
        .collect();

    match lifecycle.first() {
        Some(first) if first.kind == WaypointKind::Start => {}
        _ => return Err("timeline does not begin with a start waypoint".to_string()),
    }
    match lifecycle.last() {
        Some(last) if last.kind == WaypointKind::Finish => {}
        _ => return Err("timeline does not end with a finish waypoint".to_string()),
    }

    let mut paused = false;
    for waypoint in &lifecycle[1..lifecycle.len() - 1] {
        match (waypoint.kind, paused) {
            (WaypointKind::Pause, false) => paused = true,
            (WaypointKind::Resume, true) => paused = false,
            (kind, _) => {
                return Err(format!(
                    "unexpected {:?} waypoint at {}",
                    kind, waypoint.timestamp
                ))
            }
        }
    }

    if waypoints
        .windows(2)
        .any(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        return Err("waypoints are not in chronological order".to_string());
    }

    Ok(())
}
