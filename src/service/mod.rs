// Service layer: one service per aggregate, each cheap to clone around the pool.
pub mod ai_service;
pub mod auth_service;
pub mod course_service;
pub mod email_service;
pub mod gamification_service;
pub mod gps_service;
pub mod llm_service;
pub mod match_service;
pub mod notification_service;
pub mod performance_service;
pub mod player_service;
pub mod playermaker_service;
pub mod portal_service;
pub mod retry;
pub mod skill_service;
pub mod tactics_service;
pub mod team_service;
pub mod video_service;

pub use ai_service::AiService;
pub use auth_service::AuthService;
pub use course_service::CourseService;
pub use gamification_service::GamificationService;
pub use gps_service::GpsService;
pub use match_service::MatchService;
pub use notification_service::NotificationService;
pub use performance_service::PerformanceService;
pub use player_service::PlayerService;
pub use portal_service::PortalService;
pub use skill_service::SkillService;
pub use tactics_service::TacticsService;
pub use team_service::TeamService;
pub use video_service::VideoService;
