use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::user::Role;

/// GET /api/portal/parent
pub async fn parent_dashboard(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<impl Responder, ApiError> {
    user.require_any(&[Role::Parent])?;
    let dashboard = state.portal.parent_dashboard(user.id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

/// GET /api/portal/coach
pub async fn coach_dashboard(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let dashboard = state
        .portal
        .coach_dashboard(user.id, user.role, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/portal/parent", web::get().to(parent_dashboard))
        .route("/portal/coach", web::get().to(coach_dashboard));
}
