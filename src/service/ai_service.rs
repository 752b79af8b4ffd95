//! Prompt wrappers around the LLM client: opponent scouting reports and
//! event detection for match video.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api_error::ApiError;
use crate::models::match_model::{Match, MatchResponse};
use crate::models::team::{Team, TeamRecord};
use crate::models::video::{EventSource, NewVideoEvent, Video, VideoEvent, VideoEventType};
use crate::service::llm_service::{ChatMessage, LlmClient, LlmError};
use crate::service::match_service::MatchService;
use crate::service::team_service::TeamService;
use crate::service::video_service::{within_duration, VideoService};

const ANALYST_ROLE: &str = "You are an experienced youth football analyst. \
    Give practical, age-appropriate advice a grassroots coach can apply in training this week.";

const EVENT_DETECTOR_ROLE: &str = "You tag football match footage. \
    Reply with a JSON array only, no prose.";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OpponentAnalysisRequest {
    pub team_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub opponent: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpponentAnalysis {
    pub team_id: Uuid,
    pub opponent: String,
    pub record: TeamRecord,
    pub head_to_head: Vec<MatchResponse>,
    pub analysis: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DetectEventsRequest {
    #[validate(length(min = 1, max = 200))]
    pub observations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectedEvents {
    pub video_id: Uuid,
    pub accepted: Vec<VideoEvent>,
    pub discarded: usize,
}

pub fn opponent_prompt(
    team: &Team,
    record: &TeamRecord,
    head_to_head: &[Match],
    opponent: &str,
    notes: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Prepare a scouting report for {} ({}, season {}) ahead of their match against {}.\n\n",
        team.name, team.age_group, team.season, opponent
    );

    let _ = writeln!(
        prompt,
        "Season record: played {}, won {}, drawn {}, lost {}, goals {}-{}, points {}.",
        record.played,
        record.won,
        record.drawn,
        record.lost,
        record.goals_for,
        record.goals_against,
        record.points
    );

    if head_to_head.is_empty() {
        let _ = writeln!(prompt, "No previous results against {opponent}.");
    } else {
        let _ = writeln!(prompt, "Previous results against {opponent}:");
        for m in head_to_head {
            let _ = writeln!(
                prompt,
                "- {} ({}): {}",
                m.match_date.format("%Y-%m-%d"),
                if m.is_home { "home" } else { "away" },
                m.scoreline().unwrap_or_else(|| "no score".to_string())
            );
        }
    }

    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        let _ = writeln!(prompt, "\nCoach notes: {notes}");
    }

    prompt.push_str(
        "\nCover: likely opponent strengths, weaknesses to exploit, a suggested formation, \
         and three focus points for the pre-match session.",
    );
    prompt
}

pub fn video_prompt(video: &Video, observations: &[String]) -> String {
    let allowed: Vec<&str> = VideoEventType::ALL.iter().map(|t| t.as_str()).collect();

    let mut prompt = format!(
        "Video: \"{}\" lasting {} seconds.\nCoach observations:\n",
        video.title, video.duration_seconds
    );
    for line in observations.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
        let _ = writeln!(prompt, "- {line}");
    }
    let _ = write!(
        prompt,
        "\nReturn a JSON array of events. Each event is an object with \
         \"timestamp_seconds\" (number), \"type\" (one of: {}), \"description\" (short text) \
         and \"confidence\" (0 to 1).",
        allowed.join(", ")
    );
    prompt
}

/// Removes a markdown fence wrapped around the whole reply. Only the opening
/// fence (with its language tag) and the closing one are dropped.
fn strip_code_fences(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn first_json_array(text: &str) -> Option<Vec<Value>> {
    text.match_indices('[').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<Vec<Value>>()
            .next()
            .and_then(Result::ok)
    })
}

/// Accepts seconds as a number, a numeric string, or `mm:ss`.
fn timestamp_of(item: &Value) -> Option<f64> {
    let raw = ["timestamp_seconds", "timestamp", "time", "t"]
        .iter()
        .find_map(|key| item.get(*key))?;

    let seconds = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if let Some((m, sec)) = s.split_once(':') {
                let m: f64 = m.trim().parse().ok()?;
                let sec: f64 = sec.trim().parse().ok()?;
                if m < 0.0 || !(0.0..60.0).contains(&sec) {
                    return None;
                }
                Some(m * 60.0 + sec)
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    }?;

    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

fn text_of<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parses the model's reply into storable events. Returns the accepted
/// events and the number of items dropped.
pub fn parse_detected_events(
    reply: &str,
    duration_seconds: i32,
) -> Result<(Vec<NewVideoEvent>, usize), LlmError> {
    let cleaned = strip_code_fences(reply);
    let items = first_json_array(cleaned)
        .ok_or_else(|| LlmError::InvalidResponse("reply contains no JSON array".to_string()))?;

    let mut accepted = Vec::new();
    let mut discarded = 0;

    for item in &items {
        let Some(timestamp) = timestamp_of(item).filter(|t| within_duration(*t, duration_seconds))
        else {
            discarded += 1;
            continue;
        };

        let event_type = text_of(item, &["type", "event_type", "event"])
            .map(VideoEventType::parse_lenient)
            .unwrap_or(VideoEventType::Other);
        let confidence = item
            .get("confidence")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0));

        accepted.push(NewVideoEvent {
            timestamp_seconds: timestamp,
            event_type,
            player_id: None,
            note: text_of(item, &["description", "note"]).map(str::to_string),
            source: EventSource::Ai,
            confidence,
        });
    }

    accepted.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));
    Ok((accepted, discarded))
}

#[derive(Clone)]
pub struct AiService {
    llm: Option<LlmClient>,
    teams: TeamService,
    matches: MatchService,
    videos: VideoService,
}

impl AiService {
    pub fn new(
        llm: Option<LlmClient>,
        teams: TeamService,
        matches: MatchService,
        videos: VideoService,
    ) -> Self {
        Self {
            llm,
            teams,
            matches,
            videos,
        }
    }

    fn llm(&self) -> Result<&LlmClient, ApiError> {
        self.llm
            .as_ref()
            .ok_or_else(|| ApiError::unavailable("AI assistant is not configured"))
    }

    pub async fn opponent_analysis(
        &self,
        request: OpponentAnalysisRequest,
    ) -> Result<OpponentAnalysis, ApiError> {
        request.validate()?;
        let llm = self.llm()?;

        let opponent = request.opponent.trim();
        let team = self.teams.get_team(request.team_id).await?;
        let record = self.teams.team_record(team.id).await?;
        let head_to_head = self.matches.head_to_head(team.id, opponent).await?;

        let prompt = opponent_prompt(&team, &record, &head_to_head, opponent, request.notes.as_deref());
        let analysis = llm
            .complete(&[ChatMessage::system(ANALYST_ROLE), ChatMessage::user(prompt)])
            .await?;

        info!(team_id = %team.id, opponent = %opponent, "Opponent analysis generated");

        Ok(OpponentAnalysis {
            team_id: team.id,
            opponent: opponent.to_string(),
            record,
            head_to_head: head_to_head.into_iter().map(MatchResponse::from).collect(),
            analysis,
        })
    }

    pub async fn detect_video_events(
        &self,
        video_id: Uuid,
        request: DetectEventsRequest,
    ) -> Result<DetectedEvents, ApiError> {
        request.validate()?;
        let llm = self.llm()?;
        let video = self.videos.get_video(video_id).await?;

        let reply = llm
            .complete(&[
                ChatMessage::system(EVENT_DETECTOR_ROLE),
                ChatMessage::user(video_prompt(&video, &request.observations)),
            ])
            .await?;

        let (events, discarded) = parse_detected_events(&reply, video.duration_seconds)?;
        if discarded > 0 {
            warn!(video_id = %video_id, discarded = discarded, "Dropped model events outside the clip");
        }

        let accepted = self.videos.insert_events(video_id, events).await?;
        info!(video_id = %video_id, accepted = accepted.len(), "AI video events stored");

        Ok(DetectedEvents {
            video_id,
            accepted,
            discarded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::match_model::MatchStatus;
    use chrono::{TimeZone, Utc};

    fn team() -> Team {
        Team {
            id: Uuid::new_v4(),
            name: "Academy U12".into(),
            age_group: "U12".into(),
            season: "2025/26".into(),
            coach_id: None,
            created_at: Utc::now(),
        }
    }

    fn completed(gf: i32, ga: i32) -> Match {
        Match {
            id: Uuid::new_v4(),
            team_id: Uuid::nil(),
            opponent: "Rovers".into(),
            match_date: Utc.with_ymd_and_hms(2025, 3, 8, 10, 0, 0).unwrap(),
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
    fn test_opponent_prompt_includes_history() {
        let history = vec![completed(2, 1)];
        let record = TeamRecord::from_matches(&history);
        let prompt = opponent_prompt(&team(), &record, &history, "Rovers", Some("  tall centre backs "));

        assert!(prompt.contains("Academy U12"));
        assert!(prompt.contains("against Rovers"));
        assert!(prompt.contains("2025-03-08 (home): 2-1"));
        assert!(prompt.contains("Coach notes: tall centre backs"));
        assert!(prompt.contains("won 1"));
    }

    #[test]
    fn test_opponent_prompt_without_history() {
        let prompt = opponent_prompt(&team(), &TeamRecord::default(), &[], "City", None);
        assert!(prompt.contains("No previous results against City."));
        assert!(!prompt.contains("Coach notes"));
    }

    #[test]
    fn test_parse_events_from_fenced_reply() {
        let reply = "Here you go:\n```json\n[\n {\"timestamp_seconds\": 12.5, \"type\": \"Shot\", \"description\": \"Low drive\", \"confidence\": 0.8},\n {\"timestamp\": \"1:05\", \"type\": \"free kick\", \"confidence\": 1.7},\n {\"timestamp_seconds\": 500, \"type\": \"goal\"},\n {\"timestamp_seconds\": 30, \"type\": \"nutmeg\", \"confidence\": -2}\n]\n```";
        let (events, discarded) = parse_detected_events(reply, 120).unwrap();

        assert_eq!(discarded, 1);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, VideoEventType::Shot);
        assert_eq!(events[0].note.as_deref(), Some("Low drive"));
        assert_eq!(events[1].event_type, VideoEventType::Other);
        assert_eq!(events[1].confidence, Some(0.0));
        assert_eq!(events[2].timestamp_seconds, 65.0);
        assert_eq!(events[2].event_type, VideoEventType::FreeKick);
        assert_eq!(events[2].confidence, Some(1.0));
        assert!(events.iter().all(|e| e.source == EventSource::Ai));
    }

    #[test]
    fn test_parse_events_from_single_line_fence() {
        let reply = "```[{\"t\": 4, \"type\": \"goal\"}, {\"t\": 9, \"type\": \"save\"}]```";
        let (events, discarded) = parse_detected_events(reply, 60).unwrap();
        assert_eq!(discarded, 0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, VideoEventType::Goal);

        let tagged = "```json[{\"t\": 4, \"type\": \"goal\"}]```";
        assert_eq!(parse_detected_events(tagged, 60).unwrap().0.len(), 1);
    }

    #[test]
    fn test_strip_code_fences_keeps_inner_content() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```[3]```"), "[3]");
        assert_eq!(strip_code_fences("  [4]  "), "[4]");
    }

    #[test]
    fn test_timestamp_rejects_negative_values() {
        let item = |t: Value| serde_json::json!({ "t": t });
        assert_eq!(timestamp_of(&item(serde_json::json!("-1:30"))), None);
        assert_eq!(timestamp_of(&item(serde_json::json!("2:-5"))), None);
        assert_eq!(timestamp_of(&item(serde_json::json!("1:75"))), None);
        assert_eq!(timestamp_of(&item(serde_json::json!(-3))), None);
        assert_eq!(timestamp_of(&item(serde_json::json!("-12"))), None);
        assert_eq!(timestamp_of(&item(serde_json::json!("1:30"))), Some(90.0));
        assert_eq!(timestamp_of(&item(serde_json::json!(0))), Some(0.0));
    }

    #[test]
    fn test_parse_events_skips_bracketed_prose() {
        let reply = "Events [see below]: [{\"t\": 3, \"type\": \"corner\"}] done";
        let (events, discarded) = parse_detected_events(reply, 60).unwrap();
        assert_eq!(discarded, 0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, VideoEventType::Corner);
    }

    #[test]
    fn test_parse_events_without_array_fails() {
        assert!(matches!(
            parse_detected_events("I could not see any events.", 60),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_video_prompt_lists_types() {
        let video = Video {
            id: Uuid::nil(),
            title: "Cup final".into(),
            url: "https://videos.example.com/final.mp4".into(),
            team_id: None,
            match_id: None,
            duration_seconds: 5400,
            uploaded_by: Uuid::nil(),
            created_at: Utc::now(),
        };
        let prompt = video_prompt(&video, &["12:30 striker shoots wide".into(), "  ".into()]);
        assert!(prompt.contains("\"Cup final\" lasting 5400 seconds"));
        assert!(prompt.contains("- 12:30 striker shoots wide"));
        assert!(prompt.contains("free_kick"));
        assert_eq!(prompt.matches("\n- ").count(), 1);
    }
}
