use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::models::gamification::PlayerRewards;
use crate::models::match_model::MatchResponse;
use crate::models::performance::{
    DateRange, LeaderboardEntry, LeaderboardStat, PerformanceMetric, PlayerSummary,
};
use crate::models::player::PlayerResponse;
use crate::models::skill::RadarAxis;
use crate::models::team::{Team, TeamRecord};
use crate::models::user::Role;
use crate::service::gamification_service::GamificationService;
use crate::service::match_service::MatchService;
use crate::service::notification_service::NotificationService;
use crate::service::performance_service::PerformanceService;
use crate::service::player_service::PlayerService;
use crate::service::skill_service::SkillService;
use crate::service::team_service::TeamService;

const RECENT_METRICS: i64 = 5;
const UPCOMING_MATCHES: i64 = 5;
const TOP_SCORERS: i64 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ChildOverview {
    pub player: PlayerResponse,
    pub recent_metrics: Vec<PerformanceMetric>,
    pub summary: PlayerSummary,
    pub radar: Vec<RadarAxis>,
    pub rewards: PlayerRewards,
    pub upcoming_matches: Vec<MatchResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParentDashboard {
    pub children: Vec<ChildOverview>,
    pub unread_notifications: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamOverview {
    pub team: Team,
    pub record: TeamRecord,
    pub player_count: usize,
    pub top_scorers: Vec<LeaderboardEntry>,
    pub upcoming_matches: Vec<MatchResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoachDashboard {
    pub teams: Vec<TeamOverview>,
    pub unread_notifications: i64,
}

#[derive(Clone)]
pub struct PortalService {
    teams: TeamService,
    players: PlayerService,
    matches: MatchService,
    performance: PerformanceService,
    skills: SkillService,
    gamification: GamificationService,
    notifications: NotificationService,
}

impl PortalService {
    pub fn new(
        teams: TeamService,
        players: PlayerService,
        matches: MatchService,
        performance: PerformanceService,
        skills: SkillService,
        gamification: GamificationService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            teams,
            players,
            matches,
            performance,
            skills,
            gamification,
            notifications,
        }
    }

    pub async fn parent_dashboard(
        &self,
        parent_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ParentDashboard, ApiError> {
        let today = now.date_naive();
        let mut children = Vec::new();

        for player in self.players.children_of(parent_id).await? {
            let player_id = player.id;
            let upcoming_matches = match player.team_id {
                Some(team_id) => self
                    .matches
                    .upcoming_for_team(team_id, now, UPCOMING_MATCHES)
                    .await?
                    .into_iter()
                    .map(MatchResponse::from)
                    .collect(),
                None => Vec::new(),
            };

            children.push(ChildOverview {
                recent_metrics: self.performance.recent_for_player(player_id, RECENT_METRICS).await?,
                summary: self
                    .performance
                    .player_summary(player_id, &DateRange::default())
                    .await?,
                radar: self.skills.radar(player_id).await?,
                rewards: self.gamification.player_rewards(player_id, today).await?,
                upcoming_matches,
                player: PlayerResponse::from_player(player, today),
            });
        }

        Ok(ParentDashboard {
            children,
            unread_notifications: self.notifications.unread_count(parent_id).await?,
        })
    }

    /// Coaches see the teams they coach; admins see every team.
    pub async fn coach_dashboard(
        &self,
        user_id: Uuid,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<CoachDashboard, ApiError> {
        let coach_filter = match role {
            Role::Admin => None,
            Role::Coach => Some(user_id),
            Role::Parent | Role::Player => return Err(ApiError::Forbidden),
        };

        let mut teams = Vec::new();
        for team in self.teams.list_teams(coach_filter).await? {
            let players = self.teams.team_players(team.id).await?;
            teams.push(TeamOverview {
                record: self.teams.team_record(team.id).await?,
                player_count: players.iter().filter(|p| p.active).count(),
                top_scorers: self
                    .performance
                    .team_leaderboard(team.id, LeaderboardStat::Goals, TOP_SCORERS)
                    .await?,
                upcoming_matches: self
                    .matches
                    .upcoming_for_team(team.id, now, UPCOMING_MATCHES)
                    .await?
                    .into_iter()
                    .map(MatchResponse::from)
                    .collect(),
                team,
            });
        }

        Ok(CoachDashboard {
            teams,
            unread_notifications: self.notifications.unread_count(user_id).await?,
        })
    }
}
