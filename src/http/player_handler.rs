use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::player::{
    CreatePlayerRequest, LinkGuardianRequest, PlayerFilter, PlayerResponse, UpdatePlayerRequest,
};
use crate::models::user::Role;

/// POST /api/players
pub async fn create_player(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreatePlayerRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    info!(
        user_id = %user.id,
        name = %format!("{} {}", request.first_name, request.last_name),
        "Create player request"
    );

    let player = state.players.create_player(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(PlayerResponse::from_player(player, Utc::now().date_naive())))
}

/// GET /api/players
pub async fn list_players(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<PlayerFilter>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let today = Utc::now().date_naive();
    let players: Vec<PlayerResponse> = state
        .players
        .list_players(&query)
        .await?
        .into_iter()
        .map(|p| PlayerResponse::from_player(p, today))
        .collect();
    Ok(HttpResponse::Ok().json(players))
}

/// GET /api/players/mine
///
/// A parent's linked children.
pub async fn my_children(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<impl Responder, ApiError> {
    user.require_any(&[Role::Parent])?;
    let today = Utc::now().date_naive();
    let players: Vec<PlayerResponse> = state
        .players
        .children_of(user.id)
        .await?
        .into_iter()
        .map(|p| PlayerResponse::from_player(p, today))
        .collect();
    Ok(HttpResponse::Ok().json(players))
}

/// GET /api/players/{id}
pub async fn get_player(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PlayerResponse::from_player(player, Utc::now().date_naive())))
}

/// PATCH /api/players/{id}
pub async fn update_player(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdatePlayerRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let player = state
        .players
        .update_player(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(PlayerResponse::from_player(player, Utc::now().date_naive())))
}

/// DELETE /api/players/{id}
pub async fn delete_player(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.players.delete_player(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/players/{id}/guardians
pub async fn link_guardian(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<LinkGuardianRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let player_id = path.into_inner();
    info!(player_id = %player_id, parent_id = %request.parent_id, "Link guardian request");

    let link = state
        .players
        .link_guardian(player_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(link))
}

/// GET /api/players/{id}/guardians
pub async fn list_guardians(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    let links = state.players.guardians_of(player.id).await?;
    Ok(HttpResponse::Ok().json(links))
}

/// DELETE /api/players/{id}/guardians/{parent_id}
pub async fn unlink_guardian(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let (player_id, parent_id) = path.into_inner();
    state.players.unlink_guardian(player_id, parent_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/players", web::post().to(create_player))
        .route("/players", web::get().to(list_players))
        .route("/players/mine", web::get().to(my_children))
        .route("/players/{id}", web::get().to(get_player))
        .route("/players/{id}", web::patch().to(update_player))
        .route("/players/{id}", web::delete().to(delete_player))
        .route("/players/{id}/guardians", web::post().to(link_guardian))
        .route("/players/{id}/guardians", web::get().to(list_guardians))
        .route(
            "/players/{id}/guardians/{parent_id}",
            web::delete().to(unlink_guardian),
        );
}
