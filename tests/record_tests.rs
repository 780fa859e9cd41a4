#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use activity_tracker::config::TrackingConfig;
    use activity_tracker::error::TrackerError;
    use activity_tracker::sessions::record::{export_json, import_json};
    use activity_tracker::sessions::store::SessionStore;
    use activity_tracker::tracking::models::{
        ActivityKind, ActivitySession, ActivityState, PositionFix, WaypointKind,
    };
    use activity_tracker::tracking::SessionMachine;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    const METERS_PER_DEGREE: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

    fn at(start: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
        start + Duration::seconds(secs)
    }

    fn completed_session(kind: ActivityKind, start: DateTime<Utc>) -> ActivitySession {
        let fix = |north: f64, secs: i64| {
            PositionFix::new(
                52.0 + north / METERS_PER_DEGREE,
                13.0,
                4.0,
                at(start, secs),
            )
            .with_altitude(30.0 + north / 10.0)
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("device".to_string(), "test".to_string());

        let mut machine = SessionMachine::new(TrackingConfig::default());
        machine
            .begin(kind, &fix(0.0, 0), at(start, 0), metadata)
            .unwrap();
        machine.on_fix(&fix(30.0, 10), at(start, 10));
        machine.pause(at(start, 15)).unwrap();
        machine.resume(at(start, 45)).unwrap();
        machine.on_fix(&fix(65.0, 60), at(start, 60));
        machine.stop(at(start, 70)).unwrap()
    }

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 7, 30, 0).unwrap()
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("sessions_{}", Uuid::new_v4()))
    }

    #[test]
    fn test_export_import_preserves_every_field() {
        let session = completed_session(ActivityKind::Running, start_time());

        let json = export_json(&session).unwrap();
        let imported = import_json(&json).unwrap();

        assert_eq!(imported, session);
        assert_eq!(imported.stats.paused, std::time::Duration::from_secs(30));
        assert_eq!(imported.metadata["device"], "test");
    }

    #[test]
    fn test_export_rejects_unfinished_session() {
        let session = ActivitySession::new(ActivityKind::Walking, start_time());

        let result = export_json(&session);

        assert!(matches!(result, Err(TrackerError::InvalidRecord(_))));
    }

    #[test]
    fn test_import_rejects_running_session() {
        let mut session = completed_session(ActivityKind::Running, start_time());
        session.state = ActivityState::Running;
        let json = serde_json::to_string(&session).unwrap();

        assert!(matches!(
            import_json(&json),
            Err(TrackerError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_import_rejects_broken_timeline() {
        let mut session = completed_session(ActivityKind::Running, start_time());
        session.waypoints.retain(|w| w.kind != WaypointKind::Finish);
        let json = serde_json::to_string(&session).unwrap();

        assert!(matches!(
            import_json(&json),
            Err(TrackerError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_import_rejects_missing_end_time() {
        let mut session = completed_session(ActivityKind::Running, start_time());
        session.stats.end_time = None;
        let json = serde_json::to_string(&session).unwrap();

        assert!(matches!(
            import_json(&json),
            Err(TrackerError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        assert!(matches!(
            import_json("{\"id\": 42"),
            Err(TrackerError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_store_save_and_load() {
        let dir = temp_dir();
        let store = SessionStore::new(&dir);
        let session = completed_session(ActivityKind::Hiking, start_time());

        let path = store.save(&session).await.unwrap();
        assert!(path.ends_with(format!("{}.json", session.id)));

        let loaded = store.load(session.id).await.unwrap();
        assert_eq!(loaded, session);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_store_load_missing_session() {
        let store = SessionStore::new(temp_dir());

        let result = store.load(Uuid::new_v4()).await;

        assert!(matches!(result, Err(TrackerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_store_list_most_recent_first_and_skips_garbage() {
        let dir = temp_dir();
        let store = SessionStore::new(&dir);

        let older = completed_session(ActivityKind::Walking, start_time());
        let newer = completed_session(ActivityKind::Cycling, at(start_time(), 86_400));
        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();
        std::fs::write(dir.join("broken.json"), "not json").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let sessions = store.list().await.unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, newer.id);
        assert_eq!(sessions[1].id, older.id);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_store_list_missing_dir_is_empty() {
        let store = SessionStore::new(temp_dir());

        assert!(store.list().await.unwrap().is_empty());
    }
}
