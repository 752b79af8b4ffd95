use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::performance::{
    CreateMetricRequest, DateRange, LeaderboardStat, UpdateMetricRequest,
};

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub stat: LeaderboardStat,
    pub limit: Option<i64>,
}

/// POST /api/performance
pub async fn create_metric(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreateMetricRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    info!(player_id = %request.player_id, recorded_on = %request.recorded_on, "Record metric request");

    let metric = state.performance.create_metric(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(metric))
}

/// GET /api/performance/{id}
pub async fn get_metric(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let metric = state.performance.get_metric(path.into_inner()).await?;
    state.viewable_player(&user, metric.player_id).await?;
    Ok(HttpResponse::Ok().json(metric))
}

/// PATCH /api/performance/{id}
pub async fn update_metric(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateMetricRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let metric = state
        .performance
        .update_metric(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(metric))
}

/// DELETE /api/performance/{id}
pub async fn delete_metric(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.performance.delete_metric(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/players/{id}/performance
pub async fn player_metrics(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    range: web::Query<DateRange>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    let metrics = state.performance.list_for_player(player.id, &range).await?;
    Ok(HttpResponse::Ok().json(metrics))
}

/// GET /api/players/{id}/performance/summary
pub async fn player_summary(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    range: web::Query<DateRange>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    let summary = state.performance.player_summary(player.id, &range).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// GET /api/teams/{id}/leaderboard?stat=goals
pub async fn team_leaderboard(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<LeaderboardParams>,
) -> Result<impl Responder, ApiError> {
    let team_id = path.into_inner();
    state.teams.get_team(team_id).await?;

    let entries = state
        .performance
        .team_leaderboard(team_id, query.stat, query.limit.unwrap_or(10))
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/performance", web::post().to(create_metric))
        .route("/performance/{id}", web::get().to(get_metric))
        .route("/performance/{id}", web::patch().to(update_metric))
        .route("/performance/{id}", web::delete().to(delete_metric))
        .route("/players/{id}/performance", web::get().to(player_metrics))
        .route(
            "/players/{id}/performance/summary",
            web::get().to(player_summary),
        )
        .route("/teams/{id}/leaderboard", web::get().to(team_leaderboard));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_params() {
        let query = web::Query::<LeaderboardParams>::from_query("stat=distance&limit=5").unwrap();
        assert_eq!(query.stat, LeaderboardStat::Distance);
        assert_eq!(query.limit, Some(5));
        assert!(web::Query::<LeaderboardParams>::from_query("stat=tackles").is_err());
    }

    #[test]
    fn test_date_range_query() {
        let range = web::Query::<DateRange>::from_query("from=2025-09-01&to=2025-10-01").unwrap();
        assert!(range.check().is_ok());
    }
}
