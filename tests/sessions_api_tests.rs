#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use activity_tracker::aggregate::models::SummaryResponse;
    use activity_tracker::api;
    use activity_tracker::config::{AppConfig, TrackingConfig};
    use activity_tracker::sessions::models::SessionView;
    use activity_tracker::tracking::models::{
        ActivityKind, ActivitySession, ActivityState, PositionFix,
    };
    use activity_tracker::tracking::{AcquisitionPolicy, ChannelSource};
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use chrono::Utc;
    use serde_json::json;

    fn test_config(tracking: TrackingConfig) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            sessions_dir: std::env::temp_dir().join(format!("api_{}", uuid::Uuid::new_v4())),
            tracking,
        }
    }

    fn quick_acquisition() -> TrackingConfig {
        TrackingConfig {
            acquisition: AcquisitionPolicy {
                attempts: 1,
                attempt_timeout: Duration::from_millis(100),
                retry_delay: Duration::ZERO,
            },
            ..TrackingConfig::default()
        }
    }

    /// Offer an initial fix until the engine has switched updates on.
    fn feed_initial_fix(source: Arc<ChannelSource>) {
        tokio::spawn(async move {
            let fix = PositionFix::new(45.0, 7.0, 5.0, Utc::now());
            while !source.push(fix.clone()) {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        });
    }

    fn cleanup(config: &AppConfig) {
        let _ = std::fs::remove_dir_all(&config.sessions_dir);
    }

    #[actix_web::test]
    async fn test_session_lifecycle_over_http() {
        let config = test_config(TrackingConfig::default());
        let state = web::Data::new(api::build_state(&config));
        let source = state.source.clone();
        let app = test::init_service(App::new().app_data(state.clone()).configure(api::configure)).await;

        let req = test::TestRequest::get().uri("/session").to_request();
        let view: SessionView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.state, ActivityState::Idle);
        assert!(view.session.is_none());

        feed_initial_fix(source.clone());
        let req = test::TestRequest::post()
            .uri("/session/start")
            .set_json(json!({ "kind": "walking", "metadata": { "route": "park" } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let started: ActivitySession = test::read_body_json(resp).await;
        assert_eq!(started.kind, ActivityKind::Walking);
        assert_eq!(started.metadata["route"], "park");

        let fix = PositionFix::new(45.0002, 7.0, 5.0, Utc::now());
        let req = test::TestRequest::post().uri("/fixes").set_json(&fix).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let req = test::TestRequest::post().uri("/session/pause").to_request();
        let view: SessionView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.state, ActivityState::Paused);

        let req = test::TestRequest::post().uri("/session/pause").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post().uri("/session/resume").to_request();
        let view: SessionView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.state, ActivityState::Running);

        let req = test::TestRequest::post().uri("/session/stop").to_request();
        let record: ActivitySession = test::call_and_read_body_json(&app, req).await;
        assert_eq!(record.state, ActivityState::Completed);
        assert_eq!(record.id, started.id);

        let req = test::TestRequest::get()
            .uri(&format!("/sessions/{}", record.id))
            .to_request();
        let stored: ActivitySession = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stored, record);

        let req = test::TestRequest::get().uri("/sessions").to_request();
        let listed: Vec<ActivitySession> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);

        let req = test::TestRequest::get().uri("/sessions/summary").to_request();
        let summary: SummaryResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary.total_activities, 1);
        assert_eq!(summary.by_kind["walking"].total_activities, 1);

        let req = test::TestRequest::post().uri("/fixes").set_json(&fix).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post().uri("/session/reset").to_request();
        let view: SessionView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.state, ActivityState::Idle);

        assert!(config.sessions_dir.join(format!("{}.json", record.id)).exists());
        cleanup(&config);
    }

    #[actix_web::test]
    async fn test_start_without_fix_is_unavailable() {
        let config = test_config(quick_acquisition());
        let state = web::Data::new(api::build_state(&config));
        let app = test::init_service(App::new().app_data(state.clone()).configure(api::configure)).await;

        let req = test::TestRequest::post()
            .uri("/session/start")
            .set_json(json!({ "kind": "running" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(state.engine.state(), ActivityState::Idle);
    }

    #[actix_web::test]
    async fn test_commands_conflict_while_idle() {
        let config = test_config(TrackingConfig::default());
        let state = web::Data::new(api::build_state(&config));
        let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

        for uri in ["/session/pause", "/session/resume", "/session/stop"] {
            let req = test::TestRequest::post().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CONFLICT, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_post_fix_validation() {
        let config = test_config(TrackingConfig::default());
        let state = web::Data::new(api::build_state(&config));
        let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

        let bad = PositionFix::new(123.0, 7.0, 5.0, Utc::now());
        let req = test::TestRequest::post().uri("/fixes").set_json(&bad).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let good = PositionFix::new(45.0, 7.0, 5.0, Utc::now());
        let req = test::TestRequest::post().uri("/fixes").set_json(&good).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_stored_session_lookup_errors() {
        let config = test_config(TrackingConfig::default());
        let state = web::Data::new(api::build_state(&config));
        let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

        let req = test::TestRequest::get().uri("/sessions/not-a-uuid").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri(&format!("/sessions/{}", uuid::Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_stop_reports_unstored_record() {
        let config = test_config(TrackingConfig::default());
        // A plain file where the sessions directory should be.
        std::fs::write(&config.sessions_dir, "occupied").unwrap();
        let state = web::Data::new(api::build_state(&config));
        let source = state.source.clone();
        let app = test::init_service(App::new().app_data(state.clone()).configure(api::configure)).await;

        feed_initial_fix(source);
        let req = test::TestRequest::post()
            .uri("/session/start")
            .set_json(json!({ "kind": "running" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post().uri("/session/stop").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let record: ActivitySession = test::read_body_json(resp).await;
        assert_eq!(record.state, ActivityState::Completed);
        assert_eq!(state.engine.state(), ActivityState::Completed);

        std::fs::remove_file(&config.sessions_dir).unwrap();
    }
}
