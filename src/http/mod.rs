use std::sync::Arc;

use actix_web::web;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::auth::JwtService;
use crate::config::AcademyConfig;
use crate::db::DbPool;
use crate::models::player::Player;
use crate::service::ai_service::AiService;
use crate::service::auth_service::AuthService;
use crate::service::course_service::CourseService;
use crate::service::email_service::EmailClient;
use crate::service::gamification_service::GamificationService;
use crate::service::gps_service::GpsService;
use crate::service::llm_service::LlmClient;
use crate::service::match_service::MatchService;
use crate::service::notification_service::NotificationService;
use crate::service::performance_service::PerformanceService;
use crate::service::player_service::PlayerService;
use crate::service::playermaker_service::{PlayerMakerClient, PlayerMakerService};
use crate::service::portal_service::PortalService;
use crate::service::skill_service::SkillService;
use crate::service::tactics_service::TacticsService;
use crate::service::team_service::TeamService;
use crate::service::video_service::VideoService;

pub mod ai_handler;
pub mod auth_handler;
pub mod course_handler;
pub mod gamification_handler;
pub mod gps_handler;
pub mod health;
pub mod match_handler;
pub mod notification_handler;
pub mod performance_handler;
pub mod player_handler;
pub mod portal_handler;
pub mod skill_handler;
pub mod tactics_handler;
pub mod team_handler;
pub mod video_handler;

/// Outbound clients; `None` when the integration is not configured.
#[derive(Clone, Default)]
pub struct Integrations {
    pub llm: Option<LlmClient>,
    pub playermaker: Option<PlayerMakerClient>,
    pub email: Option<EmailClient>,
}

/// Shared handler state. Every service is cheap to clone around a pool.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub redis: ConnectionManager,
    pub academy: AcademyConfig,
    pub auth: AuthService,
    pub teams: TeamService,
    pub players: PlayerService,
    pub matches: MatchService,
    pub performance: PerformanceService,
    pub skills: SkillService,
    pub tactics: TacticsService,
    pub gps: GpsService,
    pub playermaker: PlayerMakerService,
    pub videos: VideoService,
    pub ai: AiService,
    pub gamification: GamificationService,
    pub notifications: NotificationService,
    pub courses: CourseService,
    pub portal: PortalService,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        redis: ConnectionManager,
        jwt_service: Arc<JwtService>,
        academy: AcademyConfig,
        integrations: Integrations,
    ) -> Self {
        let teams = TeamService::new(pool.clone());
        let players = PlayerService::new(pool.clone());
        let matches = MatchService::new(pool.clone());
        let performance = PerformanceService::new(pool.clone());
        let skills = SkillService::new(pool.clone());
        let videos = VideoService::new(pool.clone());
        let gamification = GamificationService::new(pool.clone());

        let notifications = NotificationService::new(
            pool.clone(),
            integrations.email,
            academy.clone(),
            players.clone(),
            matches.clone(),
            performance.clone(),
            gamification.clone(),
        );
        let portal = PortalService::new(
            teams.clone(),
            players.clone(),
            matches.clone(),
            performance.clone(),
            skills.clone(),
            gamification.clone(),
            notifications.clone(),
        );

        Self {
            auth: AuthService::new(pool.clone(), jwt_service),
            tactics: TacticsService::new(pool.clone()),
            gps: GpsService::new(pool.clone()),
            playermaker: PlayerMakerService::new(
                integrations.playermaker,
                players.clone(),
                performance.clone(),
            ),
            ai: AiService::new(integrations.llm, teams.clone(), matches.clone(), videos.clone()),
            courses: CourseService::new(pool.clone(), academy.name.clone()),
            teams,
            players,
            matches,
            performance,
            skills,
            videos,
            gamification,
            notifications,
            portal,
            academy,
            redis,
            pool,
        }
    }

    /// Loads a player the caller is allowed to see, 403 otherwise.
    pub async fn viewable_player(&self, user: &AuthUser, player_id: Uuid) -> Result<Player, ApiError> {
        self.players.ensure_can_view(user.id, user.role, player_id).await
    }
}

/// Routes reachable without a token.
pub fn configure_public(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route(
            "/certificates/verify/{code}",
            web::get().to(course_handler::verify_certificate),
        )
        .configure(auth_handler::configure_public_routes);
}

/// Routes behind `AuthMiddleware`.
pub fn configure_protected(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth_handler::configure_routes)
        .configure(team_handler::configure_routes)
        .configure(player_handler::configure_routes)
        .configure(match_handler::configure_routes)
        .configure(performance_handler::configure_routes)
        .configure(skill_handler::configure_routes)
        .configure(tactics_handler::configure_routes)
        .configure(gps_handler::configure_routes)
        .configure(video_handler::configure_routes)
        .configure(ai_handler::configure_routes)
        .configure(gamification_handler::configure_routes)
        .configure(notification_handler::configure_routes)
        .configure(course_handler::configure_routes)
        .configure(portal_handler::configure_routes);
}
