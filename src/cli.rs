use std::collections::BTreeMap;

use chrono::Duration;
use tracing::{error, info};

use crate::aggregate::aggregate_sessions;
use crate::config::TrackingConfig;
use crate::error::{Result, TrackerError};
use crate::file_utils::{export_gpx_file, read_gpx_fixes};
use crate::sessions::store::SessionStore;
use crate::tracking::machine::SessionMachine;
use crate::tracking::models::{ActivityKind, ActivitySession, PositionFix};
use crate::tracking::utils::{format_duration, format_pace};

/// Drive a state machine through a recorded fix sequence.
///
/// Time is taken from the fixes themselves: the session starts at the first
/// fix, a tick is synthesized every `tick_interval` between consecutive fixes,
/// and the session stops at the last fix.
pub fn replay_fixes(
    kind: ActivityKind,
    fixes: &[PositionFix],
    config: TrackingConfig,
) -> Result<ActivitySession> {
    let Some((first, rest)) = fixes.split_first() else {
        return Err(TrackerError::invalid_record("track contains no timed points"));
    };

    let tick = Duration::from_std(config.tick_interval)
        .map_err(|e| TrackerError::config(e.to_string()))?;
    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), "replay".to_string());

    let mut machine = SessionMachine::new(config);
    machine.begin(kind, first, first.timestamp, metadata)?;

    let mut next_tick = first.timestamp + tick;
    for fix in rest {
        while next_tick < fix.timestamp {
            machine.on_tick(next_tick);
            next_tick += tick;
        }
        machine.on_fix(fix, fix.timestamp);
    }

    let end = rest.last().unwrap_or(first).timestamp;
    Ok(machine.stop(end)?)
}

pub async fn run_replay(
    file_name: &str,
    kind: ActivityKind,
    store: Option<SessionStore>,
    gpx_out: Option<&str>,
    config: TrackingConfig,
) -> Result<ActivitySession> {
    let fixes = read_gpx_fixes(file_name).await?;
    info!("Read {} fixes from {}", fixes.len(), file_name);

    let record = replay_fixes(kind, &fixes, config)?;
    print_record(&record);

    if let Some(store) = store {
        store.save(&record).await?;
    }
    if let Some(path) = gpx_out {
        export_gpx_file(&record, path)?;
    }

    Ok(record)
}

pub async fn run_summary(store: &SessionStore) -> Result<()> {
    let sessions = store.list().await?;

    if sessions.is_empty() {
        error!("No sessions found in {}", store.dir().display());
        return Ok(());
    }

    for (kind, summary) in aggregate_sessions(&sessions) {
        println!(
            "{:<8} {:>3} sessions  {:>8.2} km  {}  avg {} /km  best {} /km  +{:.0} m  {} kcal",
            kind,
            summary.total_activities,
            summary.total_distance / 1000.0,
            format_duration(
                std::time::Duration::try_from_secs_f64(summary.total_active_secs)
                    .unwrap_or(std::time::Duration::MAX)
            ),
            format_pace(summary.average_pace),
            format_pace(summary.best_pace),
            summary.total_elevation_gain,
            summary.total_calories,
        );
    }

    Ok(())
}

fn print_record(record: &ActivitySession) {
    let stats = &record.stats;
    println!("session   {}", record.id);
    println!("kind      {}", record.kind);
    println!("distance  {:.2} km", stats.distance / 1000.0);
    println!("active    {}", format_duration(stats.active));
    println!("paused    {}", format_duration(stats.paused));
    println!("pace      {} /km", format_pace(stats.average_pace));
    println!("max speed {:.2} m/s", stats.max_speed);
    println!("climb     {:.0} m", stats.elevation_gain);
    println!("steps     {}", stats.steps);
    println!("calories  {}", stats.calories);
    println!("route     {} points", record.route.len());
}
