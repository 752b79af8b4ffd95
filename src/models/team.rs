use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::match_model::{Match, MatchOutcome};
use crate::models::patch::nullable;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub age_group: String,
    pub season: String,
    pub coach_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 2, max = 80))]
    pub name: String,
    #[validate(length(min = 2, max = 8))]
    pub age_group: String,
    #[validate(length(min = 4, max = 16))]
    pub season: String,
    pub coach_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 2, max = 80))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 8))]
    pub age_group: Option<String>,
    #[validate(length(min = 4, max = 16))]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub coach_id: Option<Option<Uuid>>,
}

/// Season record built from completed matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
    pub points: u32,
}

impl TeamRecord {
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a Match>) -> Self {
        let mut record = TeamRecord::default();
        for m in matches {
            let (Some(outcome), Some(gf), Some(ga)) = (m.outcome(), m.goals_for, m.goals_against)
            else {
                continue;
            };
            record.played += 1;
            record.goals_for += gf.max(0) as u32;
            record.goals_against += ga.max(0) as u32;
            match outcome {
                MatchOutcome::Win => record.won += 1,
                MatchOutcome::Draw => record.drawn += 1,
                MatchOutcome::Loss => record.lost += 1,
            }
        }
        record.goal_difference = record.goals_for as i32 - record.goals_against as i32;
        record.points = record.won * 3 + record.drawn;
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::match_model::MatchStatus;

    fn completed(gf: i32, ga: i32) -> Match {
        Match {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            opponent: "Rovers".to_string(),
            match_date: Utc::now(),
            venue: None,
            is_home: true,
            competition: None,
            status: MatchStatus::Completed,
            goals_for: Some(gf),
            goals_against: Some(ga),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_from_matches() {
        let mut scheduled = completed(0, 0);
        scheduled.status = MatchStatus::Scheduled;
        scheduled.goals_for = None;
        scheduled.goals_against = None;

        let matches = vec![completed(3, 1), completed(2, 2), completed(0, 1), scheduled];
        let record = TeamRecord::from_matches(&matches);

        assert_eq!(record.played, 3);
        assert_eq!(record.won, 1);
        assert_eq!(record.drawn, 1);
        assert_eq!(record.lost, 1);
        assert_eq!(record.goals_for, 5);
        assert_eq!(record.goals_against, 4);
        assert_eq!(record.goal_difference, 1);
        assert_eq!(record.points, 4);
    }

    #[test]
    fn test_empty_record() {
        let record = TeamRecord::from_matches(&[]);
        assert_eq!(record, TeamRecord::default());
    }

    #[test]
    fn test_team_patch_can_unassign_coach() {
        let request: UpdateTeamRequest = serde_json::from_str(r#"{"coach_id":null}"#).unwrap();
        assert_eq!(request.coach_id, Some(None));
        assert!(request.validate().is_ok());

        let untouched: UpdateTeamRequest = serde_json::from_str(r#"{"season":"2026/27"}"#).unwrap();
        assert_eq!(untouched.coach_id, None);
    }
}
