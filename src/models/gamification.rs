use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ACTIVITY_POINTS: i32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "activity_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Training,
    Match,
    Drill,
    Lesson,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[sqlx(type_name = "badge_kind")]
pub enum BadgeKind {
    #[sqlx(rename = "streak_3")]
    #[serde(rename = "streak_3")]
    Streak3,
    #[sqlx(rename = "streak_7")]
    #[serde(rename = "streak_7")]
    Streak7,
    #[sqlx(rename = "streak_14")]
    #[serde(rename = "streak_14")]
    Streak14,
    #[sqlx(rename = "streak_30")]
    #[serde(rename = "streak_30")]
    Streak30,
    #[sqlx(rename = "points_100")]
    #[serde(rename = "points_100")]
    Points100,
    #[sqlx(rename = "points_500")]
    #[serde(rename = "points_500")]
    Points500,
    #[sqlx(rename = "points_1000")]
    #[serde(rename = "points_1000")]
    Points1000,
}

impl BadgeKind {
    const STREAKS: [(u32, BadgeKind); 4] = [
        (3, BadgeKind::Streak3),
        (7, BadgeKind::Streak7),
        (14, BadgeKind::Streak14),
        (30, BadgeKind::Streak30),
    ];

    const POINTS: [(i64, BadgeKind); 3] = [
        (100, BadgeKind::Points100),
        (500, BadgeKind::Points500),
        (1000, BadgeKind::Points1000),
    ];

    /// Extra points granted together with the badge.
    pub fn bonus_points(&self) -> i32 {
        match self {
            BadgeKind::Streak3 => 25,
            BadgeKind::Streak7 => 50,
            BadgeKind::Streak14 => 100,
            BadgeKind::Streak30 => 200,
            BadgeKind::Points100 | BadgeKind::Points500 | BadgeKind::Points1000 => 0,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            BadgeKind::Streak3 => "3-day streak",
            BadgeKind::Streak7 => "One week strong",
            BadgeKind::Streak14 => "Two week grind",
            BadgeKind::Streak30 => "Monthly machine",
            BadgeKind::Points100 => "100 points",
            BadgeKind::Points500 => "500 points",
            BadgeKind::Points1000 => "1000 points",
        }
    }

    pub fn streak_badges(streak: u32) -> impl Iterator<Item = BadgeKind> {
        Self::STREAKS
            .into_iter()
            .filter(move |(threshold, _)| streak >= *threshold)
            .map(|(_, badge)| badge)
    }

    pub fn points_badges(points: i64) -> impl Iterator<Item = BadgeKind> {
        Self::POINTS
            .into_iter()
            .filter(move |(threshold, _)| points >= *threshold)
            .map(|(_, badge)| badge)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub player_id: Uuid,
    pub activity_date: NaiveDate,
    pub kind: ActivityKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Streak {
    pub player_id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Badge {
    pub player_id: Uuid,
    pub badge: BadgeKind,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PointsEntry {
    pub id: Uuid,
    pub player_id: Uuid,
    pub points: i32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordActivityRequest {
    pub activity_date: Option<NaiveDate>,
    pub kind: ActivityKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityOutcome {
    pub created: bool,
    pub points_awarded: i32,
    pub new_badges: Vec<BadgeKind>,
    pub streak: Streak,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerRewards {
    pub player_id: Uuid,
    pub total_points: i64,
    pub streak: Streak,
    pub badges: Vec<Badge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RewardsLeaderboardEntry {
    pub player_id: Uuid,
    pub player_name: String,
    pub total_points: i64,
    pub current_streak: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub team_id: Option<Uuid>,
    pub limit: Option<i64>,
}

impl LeaderboardQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streak_badges_by_threshold() {
        assert_eq!(BadgeKind::streak_badges(2).count(), 0);
        let earned: Vec<_> = BadgeKind::streak_badges(14).collect();
        assert_eq!(
            earned,
            vec![BadgeKind::Streak3, BadgeKind::Streak7, BadgeKind::Streak14]
        );
    }

    #[test]
    fn test_points_badges_have_no_bonus() {
        let earned: Vec<_> = BadgeKind::points_badges(520).collect();
        assert_eq!(earned, vec![BadgeKind::Points100, BadgeKind::Points500]);
        assert!(earned.iter().all(|b| b.bonus_points() == 0));
        assert_eq!(BadgeKind::Streak30.bonus_points(), 200);
    }

    #[test]
    fn test_badge_serializes_with_threshold_suffix() {
        assert_eq!(serde_json::to_value(BadgeKind::Streak14).unwrap(), "streak_14");
        assert_eq!(serde_json::to_value(BadgeKind::Points1000).unwrap(), "points_1000");
    }
}
