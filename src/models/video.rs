use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::nullable;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[sqlx(type_name = "video_event_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VideoEventType {
    Goal,
    Shot,
    Pass,
    Tackle,
    Foul,
    Save,
    Corner,
    FreeKick,
    Offside,
    Substitution,
    Other,
}

impl VideoEventType {
    pub const ALL: [VideoEventType; 11] = [
        VideoEventType::Goal,
        VideoEventType::Shot,
        VideoEventType::Pass,
        VideoEventType::Tackle,
        VideoEventType::Foul,
        VideoEventType::Save,
        VideoEventType::Corner,
        VideoEventType::FreeKick,
        VideoEventType::Offside,
        VideoEventType::Substitution,
        VideoEventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoEventType::Goal => "goal",
            VideoEventType::Shot => "shot",
            VideoEventType::Pass => "pass",
            VideoEventType::Tackle => "tackle",
            VideoEventType::Foul => "foul",
            VideoEventType::Save => "save",
            VideoEventType::Corner => "corner",
            VideoEventType::FreeKick => "free_kick",
            VideoEventType::Offside => "offside",
            VideoEventType::Substitution => "substitution",
            VideoEventType::Other => "other",
        }
    }

    /// Lenient parse used for model output: case, spaces and hyphens are
    /// ignored and anything unrecognised becomes `Other`.
    pub fn parse_lenient(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .unwrap_or(VideoEventType::Other)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Manual,
    Ai,
}

pub const VIDEO_COLUMNS: &str =
    "id, title, url, team_id, match_id, duration_seconds, uploaded_by, created_at";

pub const VIDEO_EVENT_COLUMNS: &str =
    "id, video_id, timestamp_seconds, event_type, player_id, note, source, confidence, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub team_id: Option<Uuid>,
    pub match_id: Option<Uuid>,
    pub duration_seconds: i32,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoEvent {
    pub id: Uuid,
    pub video_id: Uuid,
    pub timestamp_seconds: f64,
    pub event_type: VideoEventType,
    pub player_id: Option<Uuid>,
    pub note: Option<String>,
    pub source: EventSource,
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateVideoRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(url)]
    pub url: String,
    pub team_id: Option<Uuid>,
    pub match_id: Option<Uuid>,
    #[validate(range(min = 1, max = 86400))]
    pub duration_seconds: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateVideoRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub team_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub match_id: Option<Option<Uuid>>,
    #[validate(range(min = 1, max = 86400))]
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoFilter {
    pub team_id: Option<Uuid>,
    pub match_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEventRequest {
    pub timestamp_seconds: f64,
    pub event_type: VideoEventType,
    pub player_id: Option<Uuid>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// An event ready to be stored, from a coach or from the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVideoEvent {
    pub timestamp_seconds: f64,
    pub event_type: VideoEventType,
    pub player_id: Option<Uuid>,
    pub note: Option<String>,
    pub source: EventSource,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventSummary {
    pub total: usize,
    pub by_type: BTreeMap<VideoEventType, usize>,
}

impl EventSummary {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a VideoEvent>) -> Self {
        let mut summary = EventSummary::default();
        for event in events {
            summary.total += 1;
            *summary.by_type.entry(event.event_type).or_insert(0) += 1;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient() {
        assert_eq!(VideoEventType::parse_lenient("Goal"), VideoEventType::Goal);
        assert_eq!(VideoEventType::parse_lenient("free kick"), VideoEventType::FreeKick);
        assert_eq!(VideoEventType::parse_lenient("Free-Kick"), VideoEventType::FreeKick);
        assert_eq!(VideoEventType::parse_lenient("bicycle"), VideoEventType::Other);
    }

    #[test]
    fn test_summary_counts_by_type() {
        let event = |event_type| VideoEvent {
            id: Uuid::new_v4(),
            video_id: Uuid::nil(),
            timestamp_seconds: 1.0,
            event_type,
            player_id: None,
            note: None,
            source: EventSource::Manual,
            confidence: None,
            created_at: Utc::now(),
        };
        let events = vec![
            event(VideoEventType::Shot),
            event(VideoEventType::Goal),
            event(VideoEventType::Shot),
        ];
        let summary = EventSummary::from_events(&events);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_type[&VideoEventType::Shot], 2);
        assert_eq!(summary.by_type[&VideoEventType::Goal], 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["by_type"]["shot"], 2);
    }

    #[test]
    fn test_video_url_validated() {
        let request = CreateVideoRequest {
            title: "Final".into(),
            url: "not a url".into(),
            team_id: None,
            match_id: None,
            duration_seconds: 90,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_video_patch_detaches_match() {
        let request: UpdateVideoRequest =
            serde_json::from_str(r#"{"match_id":null,"title":"Training drills"}"#).unwrap();
        assert_eq!(request.match_id, Some(None));
        assert_eq!(request.team_id, None);
        assert!(request.validate().is_ok());
    }
}
