use std::sync::Arc;

use crate::aggregate::models::{ActivitiesAggregation, SummaryResponse};
use crate::config::AppConfig;
use crate::sessions::{
    self,
    models::{ErrorResponse, SessionView, SessionsState, StartRequest},
    store::SessionStore,
};
use crate::tracking::models::{
    ActivityKind, ActivitySession, ActivityState, Coordinate, FitnessStats, PositionFix,
    Waypoint, WaypointKind,
};
use crate::tracking::{ChannelSource, MonotonicClock, TrackingEngine};
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::http::header;
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        sessions::get_session,
        sessions::start_session,
        sessions::pause_session,
        sessions::resume_session,
        sessions::stop_session,
        sessions::reset_session,
        sessions::post_fix,
        sessions::list_sessions,
        sessions::get_summary,
        sessions::get_stored_session,
    ),
    components(schemas(
        ActivitySession,
        ActivityKind,
        ActivityState,
        FitnessStats,
        Coordinate,
        PositionFix,
        Waypoint,
        WaypointKind,
        StartRequest,
        SessionView,
        ErrorResponse,
        ActivitiesAggregation,
        SummaryResponse,
    )),
    tags(
        (name = "Sessions", description = "Activity tracking session control")
    )
)]
struct ApiDoc;

/// Register every session route. `/sessions/summary` goes before `/sessions/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(sessions::get_session)
        .service(sessions::start_session)
        .service(sessions::pause_session)
        .service(sessions::resume_session)
        .service(sessions::stop_session)
        .service(sessions::reset_session)
        .service(sessions::post_fix)
        .service(sessions::list_sessions)
        .service(sessions::get_summary)
        .service(sessions::get_stored_session);
}

pub fn build_state(config: &AppConfig) -> SessionsState {
    let source = Arc::new(ChannelSource::new());
    let engine = TrackingEngine::spawn(
        source.clone(),
        Arc::new(MonotonicClock::new()),
        config.tracking.clone(),
    );

    SessionsState {
        engine,
        source,
        store: SessionStore::new(config.sessions_dir.clone()),
    }
}

pub async fn run_api(config: AppConfig) -> std::io::Result<()> {
    info!("Starting server on {}:{}...", config.host, config.port);

    let governor_conf = GovernorConfigBuilder::default()
        .milliseconds_per_request(100)
        .burst_size(50)
        .finish()
        .ok_or_else(|| std::io::Error::other("invalid rate limit configuration"))?;

    let state = web::Data::new(build_state(&config));

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add((header::X_FRAME_OPTIONS, "DENY")),
            )
            .wrap(Governor::new(&governor_conf))
            .app_data(state.clone())
            .configure(configure)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
