use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::nullable;

/// A player token on the pitch. `x` and `y` are percentages of the pitch
/// width and length with the own goal at `y = 100`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Marker {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Uuid>,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawingKind {
    Arrow,
    Line,
    DashedLine,
    Zone,
}

/// A stroke on the board, as a polyline in percent coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Drawing {
    pub kind: DrawingKind,
    pub points: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

pub const FORMATION_COLUMNS: &str =
    "id, name, shape, team_id, created_by, markers, created_at, updated_at";

pub const BOARD_COLUMNS: &str = "id, name, formation_id, created_by, markers, drawings, \
     canvas_width, canvas_height, notes, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Formation {
    pub id: Uuid,
    pub name: String,
    pub shape: String,
    pub team_id: Option<Uuid>,
    pub created_by: Uuid,
    pub markers: Json<Vec<Marker>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TacticalBoard {
    pub id: Uuid,
    pub name: String,
    pub formation_id: Option<Uuid>,
    pub created_by: Uuid,
    pub markers: Json<Vec<Marker>>,
    pub drawings: Json<Vec<Drawing>>,
    pub canvas_width: i32,
    pub canvas_height: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFormationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 3, max = 20))]
    pub shape: String,
    pub team_id: Option<Uuid>,
    /// Custom positions; generated from `shape` when omitted.
    pub markers: Option<Vec<Marker>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateFormationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// `null` turns a team formation back into a shared one.
    #[serde(default, deserialize_with = "nullable")]
    pub team_id: Option<Option<Uuid>>,
    pub markers: Option<Vec<Marker>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBoardRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub formation_id: Option<Uuid>,
    pub shape: Option<String>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    #[validate(range(min = 1, max = 10000))]
    pub canvas_width: i32,
    #[validate(range(min = 1, max = 10000))]
    pub canvas_height: i32,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBoardRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub markers: Option<Vec<Marker>>,
    pub drawings: Option<Vec<Drawing>>,
    #[validate(range(min = 1, max = 10000))]
    pub canvas_width: Option<i32>,
    #[validate(range(min = 1, max = 10000))]
    pub canvas_height: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 2000))]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescaleRequest {
    pub from_width: f64,
    pub from_height: f64,
    pub to_width: f64,
    pub to_height: f64,
    pub points: Vec<[f64; 2]>,
}
