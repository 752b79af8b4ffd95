use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::match_model::{
    CreateMatchRequest, MatchFilter, MatchResponse, RecordResultRequest, UpdateMatchRequest,
};

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
}

/// POST /api/matches
pub async fn create_match(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreateMatchRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    info!(team_id = %request.team_id, opponent = %request.opponent, "Schedule match request");

    let created = state.matches.create_match(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(MatchResponse::from(created)))
}

/// GET /api/matches
pub async fn list_matches(
    state: web::Data<AppState>,
    _user: AuthUser,
    query: web::Query<MatchFilter>,
) -> Result<impl Responder, ApiError> {
    let matches: Vec<MatchResponse> = state
        .matches
        .list_matches(&query)
        .await?
        .into_iter()
        .map(MatchResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(matches))
}

/// GET /api/matches/{id}
pub async fn get_match(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let found = state.matches.get_match(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MatchResponse::from(found)))
}

/// PATCH /api/matches/{id}
pub async fn update_match(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateMatchRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let updated = state
        .matches
        .update_match(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(MatchResponse::from(updated)))
}

/// POST /api/matches/{id}/result
pub async fn record_result(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<RecordResultRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let match_id = path.into_inner();
    info!(
        match_id = %match_id,
        goals_for = request.goals_for,
        goals_against = request.goals_against,
        "Record result request"
    );

    let updated = state
        .matches
        .record_result(match_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(MatchResponse::from(updated)))
}

/// DELETE /api/matches/{id}
pub async fn delete_match(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.matches.delete_match(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/teams/{id}/matches/upcoming
pub async fn upcoming_matches(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<UpcomingQuery>,
) -> Result<impl Responder, ApiError> {
    let team_id = path.into_inner();
    state.teams.get_team(team_id).await?;

    let limit = query.limit.unwrap_or(10).clamp(1, 50);
    let matches: Vec<MatchResponse> = state
        .matches
        .upcoming_for_team(team_id, Utc::now(), limit)
        .await?
        .into_iter()
        .map(MatchResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(matches))
}

/// POST /api/matches/{id}/reminders
pub async fn send_reminders(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let sent = state
        .notifications
        .send_match_reminders(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(sent))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/matches", web::post().to(create_match))
        .route("/matches", web::get().to(list_matches))
        .route("/matches/{id}", web::get().to(get_match))
        .route("/matches/{id}", web::patch().to(update_match))
        .route("/matches/{id}", web::delete().to(delete_match))
        .route("/matches/{id}/result", web::post().to(record_result))
        .route("/matches/{id}/reminders", web::post().to(send_reminders))
        .route(
            "/teams/{id}/matches/upcoming",
            web::get().to(upcoming_matches),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::match_model::MatchStatus;

    #[test]
    fn test_match_filter_query() {
        let query = web::Query::<MatchFilter>::from_query("status=completed").unwrap();
        assert_eq!(query.status, Some(MatchStatus::Completed));
        assert!(query.team_id.is_none());
    }
}
