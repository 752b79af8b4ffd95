use actix_web::{http::header, web, HttpResponse, Responder};
use tracing::info;
use uuid::Uuid;

use crate::analysis::heatmap;
use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::gps::{HeatmapFormat, HeatmapQuery, UploadSessionRequest};
use crate::service::playermaker_service::SyncRequest;

const SVG_WIDTH: u32 = 1050;
const SVG_HEIGHT: u32 = 680;

/// POST /api/players/{id}/gps-sessions
pub async fn upload_session(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<UploadSessionRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let player_id = path.into_inner();
    info!(player_id = %player_id, samples = request.samples.len(), "GPS upload request");

    state.players.get_player(player_id).await?;
    let session = state
        .gps
        .upload_session(player_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(session))
}

/// GET /api/players/{id}/gps-sessions
pub async fn list_sessions(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let player = state.viewable_player(&user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(state.gps.list_sessions(player.id).await?))
}

/// GET /api/gps-sessions/{id}
pub async fn get_session(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let session = state.gps.get_session(path.into_inner()).await?;
    state.viewable_player(&user, session.player_id).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// GET /api/gps-sessions/{id}/heatmap?min_lat=..&format=svg
pub async fn session_heatmap(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<HeatmapQuery>,
) -> Result<HttpResponse, ApiError> {
    let session_id = path.into_inner();
    let session = state.gps.get_session(session_id).await?;
    state.viewable_player(&user, session.player_id).await?;

    let map = state
        .gps
        .session_heatmap(session_id, query.bounds(), query.cols(), query.rows())
        .await?;

    Ok(match query.format {
        HeatmapFormat::Json => HttpResponse::Ok().json(map),
        HeatmapFormat::Svg => HttpResponse::Ok()
            .content_type("image/svg+xml")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"heatmap-{session_id}.svg\""),
            ))
            .body(heatmap::render_svg(&map, SVG_WIDTH, SVG_HEIGHT)),
    })
}

/// DELETE /api/gps-sessions/{id}
pub async fn delete_session(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.gps.delete_session(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/players/{id}/playermaker/sync
pub async fn sync_playermaker(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<SyncRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let player_id = path.into_inner();
    info!(player_id = %player_id, from = %request.from, to = %request.to, "PlayerMaker sync request");

    let report = state
        .playermaker
        .sync_player(player_id, request.from, request.to)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/players/{id}/gps-sessions", web::post().to(upload_session))
        .route("/players/{id}/gps-sessions", web::get().to(list_sessions))
        .route("/gps-sessions/{id}", web::get().to(get_session))
        .route("/gps-sessions/{id}", web::delete().to(delete_session))
        .route("/gps-sessions/{id}/heatmap", web::get().to(session_heatmap))
        .route(
            "/players/{id}/playermaker/sync",
            web::post().to(sync_playermaker),
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heatmap_query_defaults() {
        let query = web::Query::<HeatmapQuery>::from_query(
            "min_lat=51.5&min_lon=-0.2&max_lat=51.501&max_lon=-0.198",
        )
        .unwrap();
        assert_eq!(query.format, HeatmapFormat::Json);
        assert_eq!(query.cols(), HeatmapQuery::DEFAULT_COLS);
        assert_eq!(query.rows(), HeatmapQuery::DEFAULT_ROWS);
    }

    #[test]
    fn test_heatmap_query_svg() {
        let query = web::Query::<HeatmapQuery>::from_query(
            "min_lat=51.5&min_lon=-0.2&max_lat=51.501&max_lon=-0.198&format=svg&cols=999",
        )
        .unwrap();
        assert_eq!(query.format, HeatmapFormat::Svg);
        assert_eq!(query.cols(), HeatmapQuery::MAX_CELLS);
    }
}
