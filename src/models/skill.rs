use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[sqlx(type_name = "skill_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Technical,
    Tactical,
    Physical,
    Mental,
}

impl SkillCategory {
    /// Radar chart axis order.
    pub const ALL: [SkillCategory; 4] = [
        SkillCategory::Technical,
        SkillCategory::Tactical,
        SkillCategory::Physical,
        SkillCategory::Mental,
    ];
}

pub const SKILL_COLUMNS: &str =
    "id, player_id, assessed_by, assessed_on, category, skill, score, notes, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillScore {
    pub id: Uuid,
    pub player_id: Uuid,
    pub assessed_by: Option<Uuid>,
    pub assessed_on: NaiveDate,
    pub category: SkillCategory,
    pub skill: String,
    pub score: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SkillScoreInput {
    pub category: SkillCategory,
    #[validate(length(min = 1, max = 60))]
    pub skill: String,
    pub score: f64,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordAssessmentRequest {
    pub assessed_on: NaiveDate,
    #[validate(length(min = 1, max = 40), nested)]
    pub scores: Vec<SkillScoreInput>,
}

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Clamp a coach-entered score into 0-100, rounded to one decimal.
/// Non-finite input is rejected rather than clamped.
pub fn clamp_score(raw: f64) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }
    let clamped = raw.clamp(MIN_SCORE, MAX_SCORE);
    Some((clamped * 10.0).round() / 10.0)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadarAxis {
    pub category: SkillCategory,
    pub mean_score: f64,
    pub value: f64,
    pub has_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillProgress {
    pub category: SkillCategory,
    pub skill: String,
    pub latest: f64,
    pub latest_on: NaiveDate,
    pub previous: Option<f64>,
    pub delta: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score_range() {
        assert_eq!(clamp_score(-5.0), Some(0.0));
        assert_eq!(clamp_score(140.0), Some(100.0));
        assert_eq!(clamp_score(72.46), Some(72.5));
        assert_eq!(clamp_score(0.0), Some(0.0));
        assert_eq!(clamp_score(100.0), Some(100.0));
    }

    #[test]
    fn test_clamp_score_rejects_non_finite() {
        assert_eq!(clamp_score(f64::NAN), None);
        assert_eq!(clamp_score(f64::INFINITY), None);
    }

    #[test]
    fn test_assessment_requires_scores() {
        let request = RecordAssessmentRequest {
            assessed_on: NaiveDate::from_ymd_opt(2025, 9, 20).unwrap(),
            scores: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_nested_skill_name_validated() {
        let request = RecordAssessmentRequest {
            assessed_on: NaiveDate::from_ymd_opt(2025, 9, 20).unwrap(),
            scores: vec![SkillScoreInput {
                category: SkillCategory::Technical,
                skill: String::new(),
                score: 50.0,
                notes: None,
            }],
        };
        assert!(request.validate().is_err());
    }
}
