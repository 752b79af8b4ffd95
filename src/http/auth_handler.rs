use crate::api_error::ApiError;
use crate::auth::middleware::{bearer_token, AuthUser};
use crate::http::AppState;
use crate::models::user::{CreateUserRequest, LoginRequest, Role, UserProfile};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Logout request; the refresh token is revoked alongside the access token
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Change password request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<CreateUserRequest>,
) -> Result<impl Responder, ApiError> {
    info!(email = %request.email, role = %request.role, "Registration request received");

    let response = state.auth.register(request.into_inner()).await?;

    Ok(HttpResponse::Created().json(response))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<impl Responder, ApiError> {
    info!(email = %request.email, "Login request received");

    let response = state.auth.login(request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/auth/refresh
pub async fn refresh_token(
    state: web::Data<AppState>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<impl Responder, ApiError> {
    info!("Token refresh request received");

    let token_pair = state.auth.refresh_token(&request.refresh_token).await?;

    Ok(HttpResponse::Ok().json(token_pair))
}

/// POST /api/auth/logout
pub async fn logout(
    state: web::Data<AppState>,
    user: AuthUser,
    req: HttpRequest,
    request: web::Json<LogoutRequest>,
) -> Result<impl Responder, ApiError> {
    let token = bearer_token(&req)
        .ok_or_else(|| ApiError::bad_request("Missing or invalid Authorization header"))?;

    state
        .auth
        .logout(user.id, token, &request.refresh_token)
        .await?;

    info!(user_id = %user.id, "User logged out");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Logged out successfully",
    }))
}

/// GET /api/auth/me
pub async fn get_current_user(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<impl Responder, ApiError> {
    let profile: UserProfile = state.auth.get_user(user.id).await?.into();
    Ok(HttpResponse::Ok().json(profile))
}

/// PATCH /api/auth/me
pub async fn update_current_user(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, ApiError> {
    let profile = state
        .auth
        .update_phone(user.id, request.into_inner().phone)
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// POST /api/auth/change-password
pub async fn change_password(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, ApiError> {
    state
        .auth
        .change_password(user.id, &request.old_password, &request.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Password changed successfully",
    }))
}

/// POST /api/users (admin only)
pub async fn create_user(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreateUserRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_admin()?;

    info!(admin_id = %user.id, role = %request.role, "Admin creating user");

    let profile = state.auth.create_user(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

/// GET /api/users (staff only)
pub async fn list_users(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<ListUsersQuery>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let users = state.auth.list_users(query.role).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// DELETE /api/users/{id} (admin only)
pub async fn delete_user(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_admin()?;
    let user_id = path.into_inner();
    if user_id == user.id {
        return Err(ApiError::bad_request("Administrators cannot delete themselves"));
    }
    state.auth.delete_user(user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Routes reachable without a token
pub fn configure_public_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/register", web::post().to(register))
        .route("/auth/login", web::post().to(login))
        .route("/auth/refresh", web::post().to(refresh_token));
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/logout", web::post().to(logout))
        .route("/auth/me", web::get().to(get_current_user))
        .route("/auth/me", web::patch().to(update_current_user))
        .route("/auth/change-password", web::post().to(change_password))
        .route("/users", web::post().to(create_user))
        .route("/users", web::get().to(list_users))
        .route("/users/{id}", web::delete().to(delete_user));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"refresh_token":"test_token"}"#;
        let req: RefreshTokenRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.refresh_token, "test_token");

        let logout: LogoutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(logout.refresh_token, "test_token");
    }

    #[test]
    fn test_change_password_request() {
        let json = r#"{"old_password":"old12345","new_password":"new45678"}"#;
        let req: ChangePasswordRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.old_password, "old12345");
        assert_eq!(req.new_password, "new45678");
    }

    #[test]
    fn test_register_request_role() {
        let json = r#"{"email":"p@example.com","full_name":"Pat Parent","password":"longenough","role":"parent"}"#;
        let req: CreateUserRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.role, Role::Parent);
        assert!(req.phone.is_none());
    }
}
