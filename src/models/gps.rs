use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "gps_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GpsSource {
    Playermaker,
    Upload,
}

/// One GPS fix. `t` is unix time in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsSample {
    pub t: f64,
    pub lat: f64,
    pub lon: f64,
}

pub const GPS_SESSION_COLUMNS: &str = "id, player_id, source, external_id, started_at, samples, \
     total_distance_m, max_speed_kmh, sprint_count, high_intensity_distance_m, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GpsSession {
    pub id: Uuid,
    pub player_id: Uuid,
    pub source: GpsSource,
    pub external_id: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub samples: Json<Vec<GpsSample>>,
    pub total_distance_m: f64,
    pub max_speed_kmh: f64,
    pub sprint_count: i32,
    pub high_intensity_distance_m: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadSessionRequest {
    #[validate(length(min = 2, max = 100000))]
    pub samples: Vec<GpsSample>,
    #[validate(length(max = 100))]
    pub external_id: Option<String>,
}

/// Pitch corners in WGS84 degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PitchBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeatmapFormat {
    #[default]
    Json,
    Svg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeatmapQuery {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
    pub cols: Option<usize>,
    pub rows: Option<usize>,
    #[serde(default)]
    pub format: HeatmapFormat,
}

impl HeatmapQuery {
    pub const DEFAULT_COLS: usize = 21;
    pub const DEFAULT_ROWS: usize = 14;
    pub const MAX_CELLS: usize = 200;

    pub fn bounds(&self) -> PitchBounds {
        PitchBounds {
            min_lat: self.min_lat,
            min_lon: self.min_lon,
            max_lat: self.max_lat,
            max_lon: self.max_lon,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols.unwrap_or(Self::DEFAULT_COLS).clamp(1, Self::MAX_CELLS)
    }

    pub fn rows(&self) -> usize {
        self.rows.unwrap_or(Self::DEFAULT_ROWS).clamp(1, Self::MAX_CELLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heatmap_query_defaults() {
        let query: HeatmapQuery =
            serde_json::from_str(r#"{"min_lat":1,"min_lon":2,"max_lat":3,"max_lon":4}"#).unwrap();
        assert_eq!(query.cols(), 21);
        assert_eq!(query.rows(), 14);
        assert_eq!(query.format, HeatmapFormat::Json);
    }

    #[test]
    fn test_heatmap_query_clamps_grid() {
        let query: HeatmapQuery = serde_json::from_str(
            r#"{"min_lat":1,"min_lon":2,"max_lat":3,"max_lon":4,"cols":0,"rows":5000,"format":"svg"}"#,
        )
        .unwrap();
        assert_eq!(query.cols(), 1);
        assert_eq!(query.rows(), 200);
        assert_eq!(query.format, HeatmapFormat::Svg);
    }
}
