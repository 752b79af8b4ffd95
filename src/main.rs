use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use redis::aio::ConnectionManager;
use tokio::signal;
use tracing::{info, warn};

use academy_backend::auth::{AuthMiddleware, JwtConfig, JwtService, RedisRevocationStore};
use academy_backend::config::Config;
use academy_backend::db::{create_pool, run_migrations};
use academy_backend::http::{configure_protected, configure_public, AppState, Integrations};
use academy_backend::middleware::cors_middleware;
use academy_backend::service::email_service::EmailClient;
use academy_backend::service::llm_service::LlmClient;
use academy_backend::service::playermaker_service::PlayerMakerClient;
use academy_backend::telemetry::init_telemetry;

fn build_integrations(config: &Config) -> Integrations {
    let llm = match config.llm.as_ref().map(LlmClient::new) {
        Some(Ok(client)) => Some(client),
        Some(Err(err)) => {
            warn!(error = %err, "LLM client could not be built; AI features disabled");
            None
        }
        None => {
            warn!("LLM not configured; AI features disabled");
            None
        }
    };

    let playermaker = match config.playermaker.as_ref().map(PlayerMakerClient::new) {
        Some(Ok(client)) => Some(client),
        Some(Err(err)) => {
            warn!(error = %err, "PlayerMaker client could not be built; sync disabled");
            None
        }
        None => {
            info!("PlayerMaker not configured");
            None
        }
    };

    let email = match config.email.as_ref().map(EmailClient::new) {
        Some(Ok(client)) => Some(client),
        Some(Err(err)) => {
            warn!(error = %err, "Email client could not be built; email channel disabled");
            None
        }
        None => {
            info!("Email relay not configured");
            None
        }
    };

    Integrations {
        llm,
        playermaker,
        email,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_telemetry(&config.server.rust_log);

    let db_pool = create_pool(&config)
        .await
        .context("Failed to create database pool")?;
    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    let redis_client =
        redis::Client::open(config.redis.url.as_str()).context("Invalid Redis URL")?;
    let redis = ConnectionManager::new(redis_client)
        .await
        .context("Failed to connect to Redis")?;

    let jwt_service = Arc::new(JwtService::new(
        JwtConfig::from_auth_config(&config.auth),
        Arc::new(RedisRevocationStore::new(redis.clone())),
    ));

    let state = AppState::new(
        db_pool,
        redis,
        jwt_service.clone(),
        config.academy.clone(),
        build_integrations(&config),
    );

    info!(
        academy = %config.academy.name,
        host = %config.server.host,
        port = config.server.port,
        "Starting academy backend"
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors_middleware())
            .wrap(Logger::default())
            .service(
                web::scope("/api").configure(configure_public).service(
                    web::scope("")
                        .wrap(AuthMiddleware::new(jwt_service.clone()))
                        .configure(configure_protected),
                ),
            )
    })
    .bind((config.server.host.clone(), config.server.port))?
    .run();

    // Graceful shutdown
    let server_handle = server.handle();
    tokio::spawn(async move {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for shutdown signal");
            return;
        }
        info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
    });

    server.await?;
    Ok(())
}
