use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::warn;

use crate::api_error::ApiError;
use crate::http::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    redis: &'static str,
}

/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    crate::db::health_check(&state.pool).await?;

    let mut conn = state.redis.clone();
    let ping: Result<String, redis::RedisError> = redis::cmd("PING").query_async(&mut conn).await;
    let redis = match ping {
        Ok(_) => "ok",
        Err(err) => {
            warn!(error = %err, "Redis health check failed");
            "unavailable"
        }
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: if redis == "ok" { "healthy" } else { "degraded" },
        database: "ok",
        redis,
    }))
}
