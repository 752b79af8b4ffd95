use actix_web::{web, HttpResponse, Responder};
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::video::{CreateEventRequest, CreateVideoRequest, UpdateVideoRequest, VideoFilter};

/// POST /api/videos
pub async fn create_video(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreateVideoRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    info!(user_id = %user.id, title = %request.title, "Register video request");

    let video = state.videos.create_video(user.id, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(video))
}

/// GET /api/videos
pub async fn list_videos(
    state: web::Data<AppState>,
    _user: AuthUser,
    query: web::Query<VideoFilter>,
) -> Result<impl Responder, ApiError> {
    Ok(HttpResponse::Ok().json(state.videos.list_videos(&query).await?))
}

/// GET /api/videos/{id}
pub async fn get_video(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    Ok(HttpResponse::Ok().json(state.videos.get_video(path.into_inner()).await?))
}

/// PATCH /api/videos/{id}
pub async fn update_video(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateVideoRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let video = state
        .videos
        .update_video(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(video))
}

/// DELETE /api/videos/{id}
pub async fn delete_video(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.videos.delete_video(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/videos/{id}/events
pub async fn add_event(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<CreateEventRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let video_id = path.into_inner();
    info!(
        video_id = %video_id,
        event_type = ?request.event_type,
        timestamp = request.timestamp_seconds,
        "Tag video event request"
    );

    let event = state
        .videos
        .add_manual_event(video_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(event))
}

/// GET /api/videos/{id}/events
pub async fn list_events(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    Ok(HttpResponse::Ok().json(state.videos.list_events(path.into_inner()).await?))
}

/// GET /api/videos/{id}/events/summary
pub async fn event_summary(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    Ok(HttpResponse::Ok().json(state.videos.event_summary(path.into_inner()).await?))
}

/// DELETE /api/videos/{id}/events/{event_id}
pub async fn delete_event(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let (video_id, event_id) = path.into_inner();
    state.videos.delete_event(video_id, event_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/videos", web::post().to(create_video))
        .route("/videos", web::get().to(list_videos))
        .route("/videos/{id}", web::get().to(get_video))
        .route("/videos/{id}", web::patch().to(update_video))
        .route("/videos/{id}", web::delete().to(delete_video))
        .route("/videos/{id}/events", web::post().to(add_event))
        .route("/videos/{id}/events", web::get().to(list_events))
        .route("/videos/{id}/events/summary", web::get().to(event_summary))
        .route(
            "/videos/{id}/events/{event_id}",
            web::delete().to(delete_event),
        );
}
