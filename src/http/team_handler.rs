use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::player::PlayerResponse;
use crate::models::team::{CreateTeamRequest, UpdateTeamRequest};

#[derive(Debug, Deserialize)]
pub struct ListTeamsQuery {
    pub coach_id: Option<Uuid>,
}

/// POST /api/teams
pub async fn create_team(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreateTeamRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    info!(user_id = %user.id, name = %request.name, "Create team request");

    let team = state.teams.create_team(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(team))
}

/// GET /api/teams
pub async fn list_teams(
    state: web::Data<AppState>,
    _user: AuthUser,
    query: web::Query<ListTeamsQuery>,
) -> Result<impl Responder, ApiError> {
    let teams = state.teams.list_teams(query.coach_id).await?;
    Ok(HttpResponse::Ok().json(teams))
}

/// GET /api/teams/{id}
pub async fn get_team(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let team = state.teams.get_team(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(team))
}

/// PATCH /api/teams/{id}
pub async fn update_team(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateTeamRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let team = state
        .teams
        .update_team(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(team))
}

/// DELETE /api/teams/{id}
pub async fn delete_team(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.teams.delete_team(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/teams/{id}/players
pub async fn team_players(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let today = Utc::now().date_naive();
    let players: Vec<PlayerResponse> = state
        .teams
        .team_players(path.into_inner())
        .await?
        .into_iter()
        .map(|p| PlayerResponse::from_player(p, today))
        .collect();
    Ok(HttpResponse::Ok().json(players))
}

/// GET /api/teams/{id}/record
pub async fn team_record(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let record = state.teams.team_record(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(record))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/teams", web::post().to(create_team))
        .route("/teams", web::get().to(list_teams))
        .route("/teams/{id}", web::get().to(get_team))
        .route("/teams/{id}", web::patch().to(update_team))
        .route("/teams/{id}", web::delete().to(delete_team))
        .route("/teams/{id}/players", web::get().to(team_players))
        .route("/teams/{id}/record", web::get().to(team_record));
}
