use actix_web::{web, HttpResponse, Responder};
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::skill::RecordAssessmentRequest;

/// POST /api/players/{id}/skills
pub async fn record_assessment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<RecordAssessmentRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let player_id = path.into_inner();
    info!(
        player_id = %player_id,
        assessed_by = %user.id,
        scores = request.scores.len(),
        "Skill assessment request"
    );

    state.players.get_player(player_id).await?;
    let scores = state
        .skills
        .record_assessment(player_id, user.id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(scores))
}

/// GET /api/players/{id}/skills
pub async fn list_scores(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(state.skills.scores_for_player(player.id).await?))
}

/// GET /api/players/{id}/skills/profile
pub async fn profile(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(state.skills.profile(player.id).await?))
}

/// GET /api/players/{id}/skills/radar
pub async fn radar(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(state.skills.radar(player.id).await?))
}

/// GET /api/players/{id}/skills/progress
pub async fn progress(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(state.skills.progress(player.id).await?))
}

/// GET /api/skills/{id}
pub async fn get_score(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let score = state.skills.get_score(path.into_inner()).await?;
    state.viewable_player(&user, score.player_id).await?;
    Ok(HttpResponse::Ok().json(score))
}

/// DELETE /api/skills/{id}
pub async fn delete_score(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.skills.delete_score(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/players/{id}/skills", web::post().to(record_assessment))
        .route("/players/{id}/skills", web::get().to(list_scores))
        .route("/players/{id}/skills/profile", web::get().to(profile))
        .route("/players/{id}/skills/radar", web::get().to(radar))
        .route("/players/{id}/skills/progress", web::get().to(progress))
        .route("/skills/{id}", web::get().to(get_score))
        .route("/skills/{id}", web::delete().to(delete_score));
}
