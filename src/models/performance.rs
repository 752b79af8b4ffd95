use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::{merge, nullable};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "metric_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    Manual,
    Playermaker,
    Seed,
}

pub const METRIC_COLUMNS: &str = "id, player_id, match_id, recorded_on, minutes_played, goals, \
    assists, shots, shots_on_target, passes_attempted, passes_completed, tackles, interceptions, \
    saves, distance_km, top_speed_kmh, rating, source, external_id, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PerformanceMetric {
    pub id: Uuid,
    pub player_id: Uuid,
    pub match_id: Option<Uuid>,
    pub recorded_on: NaiveDate,
    pub minutes_played: i32,
    pub goals: i32,
    pub assists: i32,
    pub shots: i32,
    pub shots_on_target: i32,
    pub passes_attempted: i32,
    pub passes_completed: i32,
    pub tackles: i32,
    pub interceptions: i32,
    pub saves: i32,
    pub distance_km: Option<f64>,
    pub top_speed_kmh: Option<f64>,
    pub rating: Option<f64>,
    pub source: MetricSource,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counting stats for one appearance or session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MetricValues {
    #[validate(range(min = 0, max = 130))]
    pub minutes_played: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 50))]
    pub goals: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 50))]
    pub assists: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 200))]
    pub shots: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 200))]
    pub shots_on_target: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 2000))]
    pub passes_attempted: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 2000))]
    pub passes_completed: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 200))]
    pub tackles: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 200))]
    pub interceptions: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 200))]
    pub saves: i32,
    #[validate(range(min = 0.0, max = 30.0))]
    pub distance_km: Option<f64>,
    #[validate(range(min = 0.0, max = 45.0))]
    pub top_speed_kmh: Option<f64>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub rating: Option<f64>,
}

impl MetricValues {
    /// Field checks plus the cross-field rules the derive cannot express.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;
        if self.shots_on_target > self.shots {
            return Err("shots_on_target cannot exceed shots".to_string());
        }
        if self.passes_completed > self.passes_attempted {
            return Err("passes_completed cannot exceed passes_attempted".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMetricRequest {
    pub player_id: Uuid,
    pub match_id: Option<Uuid>,
    pub recorded_on: NaiveDate,
    #[serde(flatten)]
    pub values: MetricValues,
}

/// Partial update. Omitted fields keep their stored value; `null` clears
/// the nullable ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMetricRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub match_id: Option<Option<Uuid>>,
    pub recorded_on: Option<NaiveDate>,
    pub minutes_played: Option<i32>,
    pub goals: Option<i32>,
    pub assists: Option<i32>,
    pub shots: Option<i32>,
    pub shots_on_target: Option<i32>,
    pub passes_attempted: Option<i32>,
    pub passes_completed: Option<i32>,
    pub tackles: Option<i32>,
    pub interceptions: Option<i32>,
    pub saves: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub distance_km: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub top_speed_kmh: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub rating: Option<Option<f64>>,
}

impl UpdateMetricRequest {
    /// The stored values with this patch applied. Run `check()` on the
    /// result, since cross-field rules depend on both sides.
    pub fn merged_values(&self, current: &PerformanceMetric) -> MetricValues {
        MetricValues {
            minutes_played: self.minutes_played.unwrap_or(current.minutes_played),
            goals: self.goals.unwrap_or(current.goals),
            assists: self.assists.unwrap_or(current.assists),
            shots: self.shots.unwrap_or(current.shots),
            shots_on_target: self.shots_on_target.unwrap_or(current.shots_on_target),
            passes_attempted: self.passes_attempted.unwrap_or(current.passes_attempted),
            passes_completed: self.passes_completed.unwrap_or(current.passes_completed),
            tackles: self.tackles.unwrap_or(current.tackles),
            interceptions: self.interceptions.unwrap_or(current.interceptions),
            saves: self.saves.unwrap_or(current.saves),
            distance_km: merge(self.distance_km, current.distance_km),
            top_speed_kmh: merge(self.top_speed_kmh, current.top_speed_kmh),
            rating: merge(self.rating, current.rating),
        }
    }

    pub fn merged_match_id(&self, current: &PerformanceMetric) -> Option<Uuid> {
        merge(self.match_id, current.match_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn check(&self) -> Result<(), String> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err("from must not be after to".to_string()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub appearances: u32,
    pub minutes_played: u32,
    pub goals: u32,
    pub assists: u32,
    pub shots: u32,
    pub shots_on_target: u32,
    pub passes_attempted: u32,
    pub passes_completed: u32,
    pub tackles: u32,
    pub interceptions: u32,
    pub saves: u32,
    pub pass_accuracy_pct: Option<f64>,
    pub shot_accuracy_pct: Option<f64>,
    pub goals_per_90: Option<f64>,
    pub assists_per_90: Option<f64>,
    pub average_rating: Option<f64>,
    pub total_distance_km: f64,
    pub best_top_speed_kmh: Option<f64>,
}

impl PlayerSummary {
    pub fn from_metrics<'a>(metrics: impl IntoIterator<Item = &'a PerformanceMetric>) -> Self {
        let mut s = PlayerSummary::default();
        let mut rating_sum = 0.0;
        let mut rating_count = 0u32;

        for m in metrics {
            s.appearances += 1;
            s.minutes_played += m.minutes_played.max(0) as u32;
            s.goals += m.goals.max(0) as u32;
            s.assists += m.assists.max(0) as u32;
            s.shots += m.shots.max(0) as u32;
            s.shots_on_target += m.shots_on_target.max(0) as u32;
            s.passes_attempted += m.passes_attempted.max(0) as u32;
            s.passes_completed += m.passes_completed.max(0) as u32;
            s.tackles += m.tackles.max(0) as u32;
            s.interceptions += m.interceptions.max(0) as u32;
            s.saves += m.saves.max(0) as u32;
            s.total_distance_km += m.distance_km.unwrap_or(0.0);
            if let Some(speed) = m.top_speed_kmh {
                s.best_top_speed_kmh = Some(s.best_top_speed_kmh.map_or(speed, |b| b.max(speed)));
            }
            if let Some(rating) = m.rating {
                rating_sum += rating;
                rating_count += 1;
            }
        }

        s.pass_accuracy_pct = percentage(s.passes_completed, s.passes_attempted);
        s.shot_accuracy_pct = percentage(s.shots_on_target, s.shots);
        s.goals_per_90 = per_90(s.goals, s.minutes_played);
        s.assists_per_90 = per_90(s.assists, s.minutes_played);
        s.average_rating = (rating_count > 0).then(|| round2(rating_sum / rating_count as f64));
        s.total_distance_km = round2(s.total_distance_km);
        s
    }
}

fn percentage(part: u32, whole: u32) -> Option<f64> {
    (whole > 0).then(|| round2(part as f64 * 100.0 / whole as f64))
}

fn per_90(count: u32, minutes: u32) -> Option<f64> {
    (minutes > 0).then(|| round2(count as f64 * 90.0 / minutes as f64))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardStat {
    Goals,
    Assists,
    Rating,
    Distance,
    Minutes,
}

impl LeaderboardStat {
    /// SQL aggregate over `performance_metrics m`. Never built from user input.
    pub fn aggregate_sql(&self) -> &'static str {
        match self {
            LeaderboardStat::Goals => "COALESCE(SUM(m.goals), 0)::float8",
            LeaderboardStat::Assists => "COALESCE(SUM(m.assists), 0)::float8",
            LeaderboardStat::Rating => "AVG(m.rating)",
            LeaderboardStat::Distance => "COALESCE(SUM(m.distance_km), 0)::float8",
            LeaderboardStat::Minutes => "COALESCE(SUM(m.minutes_played), 0)::float8",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaderboardEntry {
    pub player_id: Uuid,
    pub player_name: String,
    pub value: Option<f64>,
}
