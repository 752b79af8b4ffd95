use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::{merge, nullable};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchOutcome {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

pub const MATCH_COLUMNS: &str = "id, team_id, opponent, match_date, venue, is_home, \
    competition, status, goals_for, goals_against, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Match {
    pub id: Uuid,
    pub team_id: Uuid,
    pub opponent: String,
    pub match_date: DateTime<Utc>,
    pub venue: Option<String>,
    pub is_home: bool,
    pub competition: Option<String>,
    pub status: MatchStatus,
    pub goals_for: Option<i32>,
    pub goals_against: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Result from the academy team's point of view. Only completed matches have one.
    pub fn outcome(&self) -> Option<MatchOutcome> {
        if self.status != MatchStatus::Completed {
            return None;
        }
        let (gf, ga) = (self.goals_for?, self.goals_against?);
        Some(match gf.cmp(&ga) {
            std::cmp::Ordering::Greater => MatchOutcome::Win,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::Loss,
        })
    }

    pub fn scoreline(&self) -> Option<String> {
        Some(format!("{}-{}", self.goals_for?, self.goals_against?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    #[serde(flatten)]
    pub inner: Match,
    pub outcome: Option<MatchOutcome>,
}

impl From<Match> for MatchResponse {
    fn from(m: Match) -> Self {
        Self {
            outcome: m.outcome(),
            inner: m,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMatchRequest {
    pub team_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub opponent: String,
    pub match_date: DateTime<Utc>,
    #[validate(length(max = 200))]
    pub venue: Option<String>,
    pub is_home: Option<bool>,
    #[validate(length(max = 120))]
    pub competition: Option<String>,
}

/// PATCH body; `venue` and `competition` take `null` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateMatchRequest {
    #[validate(length(min = 1, max = 120))]
    pub opponent: Option<String>,
    pub match_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 200))]
    pub venue: Option<Option<String>>,
    pub is_home: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 120))]
    pub competition: Option<Option<String>>,
    pub status: Option<MatchStatus>,
}

impl UpdateMatchRequest {
    /// The stored fixture with this patch applied. Result columns are untouched.
    pub fn apply(self, current: Match) -> Match {
        Match {
            opponent: self.opponent.unwrap_or(current.opponent),
            match_date: self.match_date.unwrap_or(current.match_date),
            venue: merge(self.venue, current.venue),
            is_home: self.is_home.unwrap_or(current.is_home),
            competition: merge(self.competition, current.competition),
            status: self.status.unwrap_or(current.status),
            ..current
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordResultRequest {
    #[validate(range(min = 0, max = 99))]
    pub goals_for: i32,
    #[validate(range(min = 0, max = 99))]
    pub goals_against: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchFilter {
    pub team_id: Option<Uuid>,
    pub status: Option<MatchStatus>,
}
