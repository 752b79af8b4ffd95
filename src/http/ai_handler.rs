use actix_web::{web, HttpResponse, Responder};
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::service::ai_service::{DetectEventsRequest, OpponentAnalysisRequest};

/// POST /api/ai/opponent-analysis
pub async fn opponent_analysis(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<OpponentAnalysisRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    info!(team_id = %request.team_id, opponent = %request.opponent, "Opponent analysis request");

    let analysis = state.ai.opponent_analysis(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(analysis))
}

/// POST /api/videos/{id}/detect-events
pub async fn detect_video_events(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<DetectEventsRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let video_id = path.into_inner();
    info!(
        video_id = %video_id,
        observations = request.observations.len(),
        "Video event detection request"
    );

    let detected = state
        .ai
        .detect_video_events(video_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(detected))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ai/opponent-analysis", web::post().to(opponent_analysis))
        .route(
            "/videos/{id}/detect-events",
            web::post().to(detect_video_events),
        );
}
