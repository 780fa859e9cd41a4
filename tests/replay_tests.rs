#[cfg(test)]
mod tests {
    use std::time::Duration;

    use activity_tracker::aggregate::aggregate_sessions;
    use activity_tracker::cli::{replay_fixes, run_summary};
    use activity_tracker::config::TrackingConfig;
    use activity_tracker::error::TrackerError;
    use activity_tracker::sessions::store::SessionStore;
    use activity_tracker::tracking::models::{ActivityKind, ActivityState, PositionFix, WaypointKind};
    use chrono::{TimeZone, Utc};

    const METERS_PER_DEGREE: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

    /// A straight northbound track, one fix every `step_secs` covering `step_m`.
    fn track(points: usize, step_m: f64, step_secs: i64) -> Vec<PositionFix> {
        let start = Utc.with_ymd_and_hms(2025, 4, 12, 6, 0, 0).unwrap();
        (0..points)
            .map(|i| {
                PositionFix::new(
                    48.0 + (i as f64 * step_m) / METERS_PER_DEGREE,
                    11.0,
                    5.0,
                    start + chrono::Duration::seconds(i as i64 * step_secs),
                )
            })
            .collect()
    }

    #[test]
    fn test_replay_produces_completed_record() {
        let fixes = track(11, 10.0, 5);

        let record = replay_fixes(ActivityKind::Running, &fixes, TrackingConfig::default()).unwrap();

        assert_eq!(record.state, ActivityState::Completed);
        assert!((record.stats.distance - 100.0).abs() < 1e-6);
        assert_eq!(record.stats.elapsed, Duration::from_secs(50));
        assert_eq!(record.stats.active, Duration::from_secs(50));
        assert_eq!(record.stats.paused, Duration::ZERO);
        assert_eq!(record.stats.start_time, fixes[0].timestamp);
        assert_eq!(record.stats.end_time, Some(fixes[10].timestamp));
        assert_eq!(record.route.len(), 11);
        assert_eq!(record.metadata["source"], "replay");
        assert_eq!(record.waypoints.first().unwrap().kind, WaypointKind::Start);
        assert_eq!(record.waypoints.last().unwrap().kind, WaypointKind::Finish);
    }

    #[test]
    fn test_replay_is_deterministic_apart_from_id() {
        let fixes = track(20, 4.0, 2);

        let first = replay_fixes(ActivityKind::Walking, &fixes, TrackingConfig::default()).unwrap();
        let second = replay_fixes(ActivityKind::Walking, &fixes, TrackingConfig::default()).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.stats, second.stats);
        assert_eq!(first.route, second.route);
    }

    #[test]
    fn test_replay_single_fix() {
        let fixes = track(1, 0.0, 0);

        let record = replay_fixes(ActivityKind::Hiking, &fixes, TrackingConfig::default()).unwrap();

        assert_eq!(record.stats.distance, 0.0);
        assert_eq!(record.stats.elapsed, Duration::ZERO);
        assert_eq!(record.route.len(), 1);
    }

    #[test]
    fn test_replay_empty_track() {
        let result = replay_fixes(ActivityKind::Running, &[], TrackingConfig::default());

        assert!(matches!(result, Err(TrackerError::InvalidRecord(_))));
    }

    #[tokio::test]
    async fn test_summary_survives_oversized_totals() {
        let dir = std::env::temp_dir().join(format!("summary_{}", uuid::Uuid::new_v4()));
        let store = SessionStore::new(&dir);

        for _ in 0..2 {
            let mut record =
                replay_fixes(ActivityKind::Running, &track(3, 10.0, 5), TrackingConfig::default())
                    .unwrap();
            record.stats.active = Duration::from_secs(u64::MAX);
            record.stats.steps = u64::MAX;
            store.save(&record).await.unwrap();
        }

        let sessions = store.list().await.unwrap();
        assert_eq!(aggregate_sessions(&sessions)["running"].total_steps, u64::MAX);
        assert!(run_summary(&store).await.is_ok());

        std::fs::remove_dir_all(dir).unwrap();
    }
}
