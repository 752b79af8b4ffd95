use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::analysis::heatmap::HeatmapError;
use crate::analysis::pitch::PitchError;
use crate::auth::jwt_service::JwtError;
use crate::messaging::PhoneError;
use crate::service::email_service::EmailError;
use crate::service::llm_service::LlmError;
use crate::service::playermaker_service::PlayerMakerError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalServerError,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        error!(error = %msg, "Internal error");
        ApiError::InternalServerError
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
    details: Option<String>,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::CacheError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (message, details) = match self {
            ApiError::DatabaseError(_) => ("Database error".to_string(), None),
            ApiError::CacheError(_) => ("Cache error".to_string(), None),
            ApiError::InternalServerError => (self.to_string(), None),
            _ => (self.to_string(), Some(self.to_string())),
        };

        let error_response = ErrorResponse {
            error: message,
            code: status.as_u16(),
            details,
        };

        HttpResponse::build(status).json(error_response)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => ApiError::Conflict("Resource already exists".to_string()),
                // foreign_key_violation
                Some("23503") => {
                    ApiError::BadRequest("Referenced resource does not exist".to_string())
                }
                // check_violation
                Some("23514") => ApiError::ValidationError(db_err.message().to_string()),
                _ => {
                    error!(error = %err, "Database error");
                    ApiError::DatabaseError(err)
                }
            },
            _ => {
                error!(error = %err, "Database error");
                ApiError::DatabaseError(err)
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::internal_error(format!("password hashing failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenGeneration(msg) => {
                ApiError::internal_error(format!("token generation failed: {}", msg))
            }
            JwtError::Revocation(msg) => ApiError::CacheError(msg),
            _ => ApiError::Unauthorized,
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::InvalidResponse(msg) => ApiError::ExternalService(msg),
            other => ApiError::ExternalService(other.to_string()),
        }
    }
}

impl From<PlayerMakerError> for ApiError {
    fn from(err: PlayerMakerError) -> Self {
        match err {
            PlayerMakerError::PlayerNotFound(id) => {
                ApiError::BadRequest(format!("PlayerMaker does not know player {}", id))
            }
            other => ApiError::ExternalService(other.to_string()),
        }
    }
}

impl From<PitchError> for ApiError {
    fn from(err: PitchError) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<HeatmapError> for ApiError {
    fn from(err: HeatmapError) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        ApiError::ExternalService(err.to_string())
    }
}

impl From<PhoneError> for ApiError {
    fn from(err: PhoneError) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::ExternalService("llm".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::unavailable("email").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn test_jwt_errors_map_to_unauthorized() {
        let err: ApiError = JwtError::TokenExpired.into();
        assert!(matches!(err, ApiError::Unauthorized));
        let err: ApiError = JwtError::TokenRevoked.into();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let response = ApiError::bad_request("name is required").error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], 400);
        assert_eq!(json["error"], "Bad request: name is required");
    }

    #[actix_web::test]
    async fn test_database_error_hides_details() {
        let response = ApiError::DatabaseError(sqlx::Error::PoolTimedOut).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Database error");
        assert!(json["details"].is_null());
    }
}
