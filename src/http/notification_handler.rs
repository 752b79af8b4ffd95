use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::notification::{BroadcastRequest, ListQuery, SendNotificationRequest, UnreadCount};

#[derive(Debug, Serialize)]
struct MarkedRead {
    updated: u64,
}

/// POST /api/notifications
pub async fn send_notification(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<SendNotificationRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    info!(
        sender_id = %user.id,
        recipient_id = %request.recipient_id,
        channel = ?request.message.channel,
        "Send notification request"
    );

    let request = request.into_inner();
    let sent = state
        .notifications
        .send(request.recipient_id, &request.message)
        .await?;
    Ok(HttpResponse::Created().json(sent))
}

/// POST /api/teams/{id}/notifications
pub async fn broadcast_to_team(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<BroadcastRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let team_id = path.into_inner();
    info!(sender_id = %user.id, team_id = %team_id, channel = ?request.message.channel, "Team broadcast request");

    let report = state
        .notifications
        .broadcast_to_team(team_id, &request.message)
        .await?;
    Ok(HttpResponse::Created().json(report))
}

/// POST /api/players/{id}/weekly-progress
pub async fn send_weekly_progress(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let sent = state
        .notifications
        .send_weekly_progress(path.into_inner(), Utc::now().date_naive())
        .await?;
    Ok(HttpResponse::Ok().json(sent))
}

/// GET /api/notifications?unread_only=true
pub async fn list_mine(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, ApiError> {
    let notifications = state
        .notifications
        .list_mine(user.id, query.unread_only)
        .await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<impl Responder, ApiError> {
    let unread = state.notifications.unread_count(user.id).await?;
    Ok(HttpResponse::Ok().json(UnreadCount { unread }))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let notification = state
        .notifications
        .mark_read(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(notification))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<impl Responder, ApiError> {
    let updated = state.notifications.mark_all_read(user.id).await?;
    Ok(HttpResponse::Ok().json(MarkedRead { updated }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/notifications", web::post().to(send_notification))
        .route("/notifications", web::get().to(list_mine))
        .route("/notifications/unread-count", web::get().to(unread_count))
        .route("/notifications/read-all", web::post().to(mark_all_read))
        .route("/notifications/{id}/read", web::post().to(mark_read))
        .route("/teams/{id}/notifications", web::post().to(broadcast_to_team))
        .route(
            "/players/{id}/weekly-progress",
            web::post().to(send_weekly_progress),
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults_to_all() {
        let query = web::Query::<ListQuery>::from_query("").unwrap();
        assert!(!query.unread_only);
        let query = web::Query::<ListQuery>::from_query("unread_only=true").unwrap();
        assert!(query.unread_only);
    }
}
