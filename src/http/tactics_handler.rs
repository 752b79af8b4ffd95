use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::pitch::{self, Canvas, Point};
use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::tactics::{
    CreateBoardRequest, CreateFormationRequest, Marker, RescaleRequest, UpdateBoardRequest,
    UpdateFormationRequest,
};

#[derive(Debug, Deserialize)]
pub struct FormationQuery {
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    #[serde(default)]
    pub mine: bool,
}

#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    pub shape: String,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Serialize)]
pub struct RescaleResponse {
    pub points: Vec<[f64; 2]>,
}

pub fn rescale_points(request: &RescaleRequest) -> Result<Vec<[f64; 2]>, ApiError> {
    let from = Canvas::new(request.from_width, request.from_height)?;
    let to = Canvas::new(request.to_width, request.to_height)?;
    Ok(request
        .points
        .iter()
        .map(|&[x, y]| {
            let p = pitch::rescale(Point { x, y }, from, to);
            [p.x, p.y]
        })
        .collect())
}

/// GET /api/tactics/layouts/{shape}
pub async fn layout(
    _user: AuthUser,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let shape = path.into_inner();
    let markers = pitch::layout_for_shape(&shape)?;
    Ok(HttpResponse::Ok().json(LayoutResponse { shape, markers }))
}

/// POST /api/tactics/rescale
pub async fn rescale(
    _user: AuthUser,
    request: web::Json<RescaleRequest>,
) -> Result<impl Responder, ApiError> {
    let points = rescale_points(&request)?;
    Ok(HttpResponse::Ok().json(RescaleResponse { points }))
}

/// POST /api/tactics/mirror
pub async fn mirror(
    _user: AuthUser,
    markers: web::Json<Vec<Marker>>,
) -> Result<impl Responder, ApiError> {
    Ok(HttpResponse::Ok().json(pitch::mirror(&markers)))
}

/// POST /api/formations
pub async fn create_formation(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreateFormationRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    info!(user_id = %user.id, shape = %request.shape, "Create formation request");

    let formation = state
        .tactics
        .create_formation(user.id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(formation))
}

/// GET /api/formations
pub async fn list_formations(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<FormationQuery>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    Ok(HttpResponse::Ok().json(state.tactics.list_formations(query.team_id).await?))
}

/// GET /api/formations/{id}
pub async fn get_formation(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    Ok(HttpResponse::Ok().json(state.tactics.get_formation(path.into_inner()).await?))
}

/// GET /api/formations/{id}/mirrored
pub async fn mirrored_formation(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let formation = state.tactics.get_formation(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(pitch::mirror(&formation.markers.0)))
}

/// PATCH /api/formations/{id}
pub async fn update_formation(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateFormationRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let formation = state
        .tactics
        .update_formation(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(formation))
}

/// DELETE /api/formations/{id}
pub async fn delete_formation(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.tactics.delete_formation(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/boards
pub async fn create_board(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreateBoardRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    info!(user_id = %user.id, name = %request.name, "Create tactical board request");

    let board = state.tactics.create_board(user.id, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(board))
}

/// GET /api/boards?mine=true
pub async fn list_boards(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<BoardQuery>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let created_by = query.mine.then_some(user.id);
    Ok(HttpResponse::Ok().json(state.tactics.list_boards(created_by).await?))
}

/// GET /api/boards/{id}
pub async fn get_board(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    Ok(HttpResponse::Ok().json(state.tactics.get_board(path.into_inner()).await?))
}

/// PATCH /api/boards/{id}
pub async fn update_board(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateBoardRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let board = state
        .tactics
        .update_board(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(board))
}

/// DELETE /api/boards/{id}
pub async fn delete_board(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.tactics.delete_board(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/tactics/layouts/{shape}", web::get().to(layout))
        .route("/tactics/rescale", web::post().to(rescale))
        .route("/tactics/mirror", web::post().to(mirror))
        .route("/formations", web::post().to(create_formation))
        .route("/formations", web::get().to(list_formations))
        .route("/formations/{id}", web::get().to(get_formation))
        .route("/formations/{id}", web::patch().to(update_formation))
        .route("/formations/{id}", web::delete().to(delete_formation))
        .route("/formations/{id}/mirrored", web::get().to(mirrored_formation))
        .route("/boards", web::post().to(create_board))
        .route("/boards", web::get().to(list_boards))
        .route("/boards/{id}", web::get().to(get_board))
        .route("/boards/{id}", web::patch().to(update_board))
        .route("/boards/{id}", web::delete().to(delete_board));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_points() {
        let request = RescaleRequest {
            from_width: 800.0,
            from_height: 600.0,
            to_width: 400.0,
            to_height: 300.0,
            points: vec![[400.0, 300.0], [0.0, 600.0]],
        };
        assert_eq!(rescale_points(&request).unwrap(), vec![[200.0, 150.0], [0.0, 300.0]]);
    }

    #[test]
    fn test_rescale_rejects_empty_canvas() {
        let request = RescaleRequest {
            from_width: 0.0,
            from_height: 600.0,
            to_width: 400.0,
            to_height: 300.0,
            points: vec![[1.0, 1.0]],
        };
        let err = rescale_points(&request).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }
}
