pub mod models;
pub mod record;
pub mod store;

use actix_web::{get, post, web, HttpResponse, Responder};
use models::{ErrorResponse, SessionView, SessionsState, StartRequest};
use tracing::error;
use uuid::Uuid;
use validator::Validate;

use crate::aggregate::{self, models::SummaryResponse};
use crate::error::{StartError, TrackerError};
use crate::tracking::models::{ActivitySession, PositionFix};

fn command_error(err: TrackerError) -> HttpResponse {
    match err {
        TrackerError::InvalidTransition(e) => HttpResponse::Conflict().json(ErrorResponse::new(e)),
        other => {
            error!("Session command failed: {}", other);
            HttpResponse::InternalServerError().json(ErrorResponse::new(other))
        }
    }
}

fn current_view(data: &SessionsState) -> HttpResponse {
    HttpResponse::Ok().json(SessionView::from(data.engine.snapshot()))
}

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current engine state and live session", body = SessionView)
    )
)]
#[get("/session")]
pub async fn get_session(data: web::Data<SessionsState>) -> impl Responder {
    current_view(data.get_ref())
}

#[utoipa::path(
    post,
    path = "/session/start",
    request_body = StartRequest,
    responses(
        (status = 201, description = "Session started", body = ActivitySession),
        (status = 409, description = "A session is already open", body = ErrorResponse),
        (status = 503, description = "No position fix could be acquired", body = ErrorResponse)
    )
)]
#[post("/session/start")]
pub async fn start_session(
    data: web::Data<SessionsState>,
    body: web::Json<StartRequest>,
) -> impl Responder {
    let StartRequest { kind, metadata } = body.into_inner();

    match data.engine.start_with_metadata(kind, metadata).await {
        Ok(session) => HttpResponse::Created().json(session),
        Err(e @ StartError::InvalidTransition(_)) => {
            HttpResponse::Conflict().json(ErrorResponse::new(e))
        }
        Err(e @ (StartError::PositionUnavailable { .. } | StartError::SourceUnstartable(_))) => {
            HttpResponse::ServiceUnavailable().json(ErrorResponse::new(e))
        }
        Err(e) => {
            error!("Could not start session: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(e))
        }
    }
}

#[utoipa::path(
    post,
    path = "/session/pause",
    responses(
        (status = 200, description = "Session paused", body = SessionView),
        (status = 409, description = "No running session", body = ErrorResponse)
    )
)]
#[post("/session/pause")]
pub async fn pause_session(data: web::Data<SessionsState>) -> impl Responder {
    match data.engine.pause().await {
        Ok(()) => current_view(data.get_ref()),
        Err(e) => command_error(e),
    }
}

#[utoipa::path(
    post,
    path = "/session/resume",
    responses(
        (status = 200, description = "Session resumed", body = SessionView),
        (status = 409, description = "No paused session", body = ErrorResponse)
    )
)]
#[post("/session/resume")]
pub async fn resume_session(data: web::Data<SessionsState>) -> impl Responder {
    match data.engine.resume().await {
        Ok(()) => current_view(data.get_ref()),
        Err(e) => command_error(e),
    }
}

#[utoipa::path(
    post,
    path = "/session/stop",
    responses(
        (status = 200, description = "Session completed and stored", body = ActivitySession),
        (status = 409, description = "No open session", body = ErrorResponse),
        (status = 500, description = "Session completed but could not be stored", body = ActivitySession)
    )
)]
#[post("/session/stop")]
pub async fn stop_session(data: web::Data<SessionsState>) -> impl Responder {
    match data.engine.stop().await {
        Ok(record) => match data.store.save(&record).await {
            Ok(_) => HttpResponse::Ok().json(record),
            Err(e) => {
                error!("Could not store session {}: {}", record.id, e);
                HttpResponse::InternalServerError().json(record)
            }
        },
        Err(e) => command_error(e),
    }
}

#[utoipa::path(
    post,
    path = "/session/reset",
    responses(
        (status = 200, description = "Engine back to idle", body = SessionView),
        (status = 409, description = "A session is still open", body = ErrorResponse)
    )
)]
#[post("/session/reset")]
pub async fn reset_session(data: web::Data<SessionsState>) -> impl Responder {
    match data.engine.reset().await {
        Ok(()) => current_view(data.get_ref()),
        Err(e) => command_error(e),
    }
}

#[utoipa::path(
    post,
    path = "/fixes",
    request_body = PositionFix,
    responses(
        (status = 202, description = "Fix delivered to the engine"),
        (status = 400, description = "Invalid fix", body = ErrorResponse),
        (status = 409, description = "Position updates are off", body = ErrorResponse)
    )
)]
#[post("/fixes")]
pub async fn post_fix(
    data: web::Data<SessionsState>,
    body: web::Json<PositionFix>,
) -> impl Responder {
    let fix = body.into_inner();

    if let Err(e) = fix.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new(e));
    }

    if data.source.push(fix) {
        HttpResponse::Accepted().finish()
    } else {
        HttpResponse::Conflict().json(ErrorResponse::new("position updates are off"))
    }
}

#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Stored sessions, most recent first", body = [ActivitySession])
    )
)]
#[get("/sessions")]
pub async fn list_sessions(data: web::Data<SessionsState>) -> impl Responder {
    match data.store.list().await {
        Ok(sessions) => HttpResponse::Ok().json(sessions),
        Err(e) => {
            error!("Error listing sessions: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[utoipa::path(
    get,
    path = "/sessions/summary",
    responses(
        (status = 200, description = "Totals per activity kind", body = SummaryResponse)
    )
)]
#[get("/sessions/summary")]
pub async fn get_summary(data: web::Data<SessionsState>) -> impl Responder {
    match data.store.list().await {
        Ok(sessions) => HttpResponse::Ok().json(aggregate::summarize(&sessions)),
        Err(e) => {
            error!("Error summarizing sessions: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[utoipa::path(
    get,
    path = "/sessions/{session_id}",
    params(
        ("session_id" = String, description = "Session ID", example = "123e4567-e89b-12d3-a456-426614174000")
    ),
    responses(
        (status = 200, description = "Stored session", body = ActivitySession),
        (status = 400, description = "Malformed session ID"),
        (status = 404, description = "Session not found")
    )
)]
#[get("/sessions/{session_id}")]
pub async fn get_stored_session(
    path: web::Path<String>,
    data: web::Data<SessionsState>,
) -> impl Responder {
    let Ok(session_id) = Uuid::parse_str(&path.into_inner()) else {
        return HttpResponse::BadRequest().finish();
    };

    match data.store.load(session_id).await {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(TrackerError::NotFound(_)) => HttpResponse::NotFound().body("Session not found"),
        Err(e) => {
            error!("Error loading session {}: {}", session_id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
