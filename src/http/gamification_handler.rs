use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::gamification::{LeaderboardQuery, RecordActivityRequest};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// POST /api/players/{id}/activities
///
/// Players log their own activity; guardians and staff may log it for them.
pub async fn record_activity(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<RecordActivityRequest>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    let today = Utc::now().date_naive();
    let request = request.into_inner();
    let date = request.activity_date.unwrap_or(today);

    info!(player_id = %player.id, kind = ?request.kind, date = %date, "Record activity request");

    let outcome = state
        .gamification
        .record_activity(player.id, date, request.kind, today)
        .await?;

    Ok(if outcome.created {
        HttpResponse::Created().json(outcome)
    } else {
        HttpResponse::Ok().json(outcome)
    })
}

/// GET /api/players/{id}/streak
pub async fn streak(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    let streak = state
        .gamification
        .streak(player.id, Utc::now().date_naive())
        .await?;
    Ok(HttpResponse::Ok().json(streak))
}

/// GET /api/players/{id}/rewards
pub async fn rewards(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    let rewards = state
        .gamification
        .player_rewards(player.id, Utc::now().date_naive())
        .await?;
    Ok(HttpResponse::Ok().json(rewards))
}

/// GET /api/players/{id}/points
pub async fn points_history(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<HistoryQuery>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    let entries = state
        .gamification
        .points_history(player.id, query.limit.unwrap_or(50))
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// GET /api/rewards/leaderboard
pub async fn leaderboard(
    state: web::Data<AppState>,
    _user: AuthUser,
    query: web::Query<LeaderboardQuery>,
) -> Result<impl Responder, ApiError> {
    let entries = state
        .gamification
        .leaderboard(query.team_id, query.limit(), Utc::now().date_naive())
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/players/{id}/activities", web::post().to(record_activity))
        .route("/players/{id}/streak", web::get().to(streak))
        .route("/players/{id}/rewards", web::get().to(rewards))
        .route("/players/{id}/points", web::get().to(points_history))
        .route("/rewards/leaderboard", web::get().to(leaderboard));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gamification::ActivityKind;

    #[test]
    fn test_activity_request_date_optional() {
        let request: RecordActivityRequest = serde_json::from_str(r#"{"kind":"drill"}"#).unwrap();
        assert_eq!(request.kind, ActivityKind::Drill);
        assert!(request.activity_date.is_none());
    }

    #[test]
    fn test_leaderboard_query_limit() {
        let query = web::Query::<LeaderboardQuery>::from_query("limit=0").unwrap();
        assert_eq!(query.limit(), 1);
        let query = web::Query::<LeaderboardQuery>::from_query("").unwrap();
        assert_eq!(query.limit(), 10);
    }
}
