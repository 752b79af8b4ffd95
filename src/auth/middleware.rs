use crate::api_error::ApiError;
use crate::auth::jwt_service::{Claims, JwtError, JwtService, TokenType};
use crate::models::user::Role;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Authentication middleware for protecting routes
pub struct AuthMiddleware {
    jwt_service: Arc<JwtService>,
}

impl AuthMiddleware {
    pub fn new(jwt_service: Arc<JwtService>) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: Arc<JwtService>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let jwt_service = self.jwt_service.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let token = match bearer_token(req.request()) {
                Some(token) => token.to_string(),
                None => {
                    warn!(path = %req.path(), "Missing or malformed authorization header");
                    return Err(ApiError::Unauthorized.into());
                }
            };

            match jwt_service.validate_token(&token, TokenType::Access).await {
                Ok(claims) => {
                    debug!(user_id = %claims.sub, role = %claims.role, "Request authenticated");
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                }
                Err(JwtError::Revocation(e)) => {
                    warn!(error = %e, "Revocation store unavailable");
                    Err(ApiError::CacheError(e).into())
                }
                Err(e) => {
                    warn!(error = %e, "Token validation failed");
                    Err(ApiError::Unauthorized.into())
                }
            }
        })
    }
}

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extract claims from request (use in route handlers)
pub trait ClaimsExt {
    fn claims(&self) -> Option<Claims>;
}

impl ClaimsExt for HttpRequest {
    fn claims(&self) -> Option<Claims> {
        self.extensions().get::<Claims>().cloned()
    }
}

/// The authenticated caller, available to handlers behind [`AuthMiddleware`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn require_any(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            warn!(user_id = %self.id, role = %self.role, "Role not permitted");
            Err(ApiError::Forbidden)
        }
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        self.require_any(&[Role::Admin, Role::Coach])
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require_any(&[Role::Admin])
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .claims()
            .ok_or(ApiError::Unauthorized)
            .and_then(|claims| {
                let id = claims.user_id().map_err(|_| ApiError::Unauthorized)?;
                Ok(AuthUser {
                    id,
                    role: claims.role,
                })
            });
        ready(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt_service_test::support::test_jwt_service;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    async fn whoami(user: AuthUser) -> HttpResponse {
        HttpResponse::Ok().body(format!("{}:{}", user.id, user.role))
    }

    async fn coaches_only(user: AuthUser) -> Result<HttpResponse, ApiError> {
        user.require_staff()?;
        Ok(HttpResponse::Ok().finish())
    }

    #[actix_web::test]
    async fn test_missing_header_rejected() {
        let jwt = Arc::new(test_jwt_service());
        let app = test::init_service(
            App::new().service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(jwt))
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/me").to_request();
        let resp = test::try_call_service(&app, req).await;
        let err = resp.err().expect("request should be rejected");
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_valid_token_reaches_handler() {
        let jwt = Arc::new(test_jwt_service());
        let user_id = Uuid::new_v4();
        let pair = jwt.generate_token_pair(user_id, Role::Coach).unwrap();

        let app = test::init_service(
            App::new().service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(jwt.clone()))
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", pair.access_token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, format!("{}:coach", user_id).as_bytes());
    }

    #[actix_web::test]
    async fn test_refresh_token_not_accepted() {
        let jwt = Arc::new(test_jwt_service());
        let pair = jwt.generate_token_pair(Uuid::new_v4(), Role::Coach).unwrap();

        let app = test::init_service(
            App::new().service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(jwt.clone()))
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", pair.refresh_token)))
            .to_request();
        let resp = test::try_call_service(&app, req).await;
        assert!(resp.is_err());
    }

    #[actix_web::test]
    async fn test_role_guard_forbids_parent() {
        let jwt = Arc::new(test_jwt_service());
        let pair = jwt.generate_token_pair(Uuid::new_v4(), Role::Parent).unwrap();

        let app = test::init_service(
            App::new().service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(jwt.clone()))
                    .route("/staff", web::get().to(coaches_only)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/staff")
            .insert_header(("Authorization", format!("Bearer {}", pair.access_token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_bearer_token_parsing() {
        let req = test::TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def"));

        let req = test::TestRequest::default()
            .insert_header(("Authorization", "Basic abc"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);
    }
}
