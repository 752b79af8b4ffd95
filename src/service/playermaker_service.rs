//! PlayerMaker integration.
//!
//! Pulls a player's wearable sessions from the vendor API and stores each one
//! as a performance metric. Imports are idempotent on the vendor session id.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::config::PlayerMakerConfig;
use crate::models::performance::{MetricSource, MetricValues};
use crate::service::performance_service::{NewMetric, PerformanceService};
use crate::service::player_service::PlayerService;
use crate::service::retry::{with_retry, RetryConfig, Retryable};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PlayerMakerError {
    #[error("PlayerMaker request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("PlayerMaker returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("PlayerMaker player {0} not found")]
    PlayerNotFound(String),
    #[error("Invalid PlayerMaker response: {0}")]
    InvalidResponse(String),
    #[error("Invalid PlayerMaker URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Retryable for PlayerMakerError {
    fn is_retryable(&self) -> bool {
        match self {
            PlayerMakerError::Network(err) => !err.is_decode() && !err.is_builder(),
            PlayerMakerError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub total_distance_m: f64,
    #[serde(default)]
    pub top_speed_ms: f64,
    #[serde(default)]
    pub sprints: u32,
    #[serde(default)]
    pub touches_left: u32,
    #[serde(default)]
    pub touches_right: u32,
}

#[derive(Debug, Deserialize)]
struct SessionsResponse {
    sessions: Vec<VendorSession>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub imported: usize,
    pub skipped: usize,
}

impl SyncReport {
    pub fn record(&mut self, imported: bool) {
        if imported {
            self.imported += 1;
        } else {
            self.skipped += 1;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncRequest {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Clone)]
pub struct PlayerMakerClient {
    base_url: url::Url,
    api_key: String,
    client: reqwest::Client,
    retry_config: RetryConfig,
}

impl PlayerMakerClient {
    pub fn new(config: &PlayerMakerConfig) -> Result<Self, PlayerMakerError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: url::Url::parse(&config.api_url)?,
            api_key: config.api_key.clone(),
            client,
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn sessions_url(
        &self,
        external_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<url::Url, PlayerMakerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                PlayerMakerError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?
            .pop_if_empty()
            .extend(["v1", "players", external_id, "sessions"]);
        url.query_pairs_mut()
            .append_pair("from", &from.to_string())
            .append_pair("to", &to.to_string());
        Ok(url)
    }

    pub async fn fetch_sessions(
        &self,
        external_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<VendorSession>, PlayerMakerError> {
        let url = &self.sessions_url(external_id, from, to)?;

        with_retry(&self.retry_config, "playermaker.sessions", move || async move {
            let response = self
                .client
                .get(url.clone())
                .bearer_auth(&self.api_key)
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(PlayerMakerError::PlayerNotFound(external_id.to_string()));
            }
            let text = response.text().await?;
            if !status.is_success() {
                return Err(PlayerMakerError::Http {
                    status: status.as_u16(),
                    body: text,
                });
            }
            parse_sessions(&text)
        })
        .await
    }
}

pub fn parse_sessions(body: &str) -> Result<Vec<VendorSession>, PlayerMakerError> {
    serde_json::from_str::<SessionsResponse>(body)
        .map(|r| r.sessions)
        .map_err(|e| PlayerMakerError::InvalidResponse(e.to_string()))
}

/// Converts a vendor session into metric values, clamped into the ranges
/// manual entries must satisfy.
pub fn metric_values(session: &VendorSession) -> MetricValues {
    let minutes = (session.end_time - session.start_time).num_minutes().clamp(0, 130) as i32;
    let distance_km = (session.total_distance_m.max(0.0) / 1000.0).min(30.0);
    let top_speed_kmh = (session.top_speed_ms.max(0.0) * 3.6).min(45.0);

    MetricValues {
        minutes_played: minutes,
        distance_km: Some((distance_km * 100.0).round() / 100.0),
        top_speed_kmh: Some((top_speed_kmh * 10.0).round() / 10.0),
        ..MetricValues::default()
    }
}

#[derive(Clone)]
pub struct PlayerMakerService {
    client: Option<PlayerMakerClient>,
    players: PlayerService,
    performance: PerformanceService,
}

impl PlayerMakerService {
    pub fn new(
        client: Option<PlayerMakerClient>,
        players: PlayerService,
        performance: PerformanceService,
    ) -> Self {
        Self {
            client,
            players,
            performance,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn sync_player(
        &self,
        player_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<SyncReport, ApiError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ApiError::unavailable("PlayerMaker integration is not configured"))?;
        if from > to {
            return Err(ApiError::validation("from must not be after to"));
        }

        let player = self.players.get_player(player_id).await?;
        let external_id = player
            .playermaker_id
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("Player has no PlayerMaker id"))?;

        let sessions = client.fetch_sessions(external_id, from, to).await?;

        let mut report = SyncReport::default();
        for session in &sessions {
            let values = metric_values(session);
            if let Err(reason) = values.check() {
                warn!(session_id = %session.id, reason = %reason, "Skipping PlayerMaker session");
                report.record(false);
                continue;
            }

            let inserted = self
                .performance
                .insert_if_new(NewMetric {
                    player_id,
                    match_id: None,
                    recorded_on: session.start_time.date_naive(),
                    values: &values,
                    source: MetricSource::Playermaker,
                    external_id: Some(&session.id),
                })
                .await?;
            report.record(inserted.is_some());
        }

        info!(
            player_id = %player_id,
            imported = report.imported,
            skipped = report.skipped,
            "PlayerMaker sync finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client(base: &str) -> PlayerMakerClient {
        PlayerMakerClient::new(&PlayerMakerConfig {
            api_url: base.to_string(),
            api_key: "key".to_string(),
        })
        .unwrap()
    }

    fn session(minutes: i64, distance_m: f64, top_speed_ms: f64) -> VendorSession {
        let start = Utc.with_ymd_and_hms(2025, 10, 4, 9, 0, 0).unwrap();
        VendorSession {
            id: "pm-1".into(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(minutes),
            total_distance_m: distance_m,
            top_speed_ms,
            sprints: 4,
            touches_left: 20,
            touches_right: 55,
        }
    }

    #[test]
    fn test_sessions_url() {
        let from = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();

        let url = client("https://api.playermaker.test/").sessions_url("abc 1", from, to).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.playermaker.test/v1/players/abc%201/sessions?from=2025-09-01&to=2025-09-30"
        );

        let url = client("https://api.playermaker.test/team").sessions_url("x", from, to).unwrap();
        assert!(url.as_str().starts_with("https://api.playermaker.test/team/v1/players/x/sessions?"));
    }

    #[test]
    fn test_parse_sessions() {
        let body = r#"{"sessions":[{"id":"s1","start_time":"2025-10-04T09:00:00Z",
            "end_time":"2025-10-04T10:15:00Z","total_distance_m":6420.5,"top_speed_ms":7.5,
            "sprints":12,"touches_left":30,"touches_right":88}]}"#;
        let sessions = parse_sessions(body).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "s1");
        assert_eq!(sessions[0].sprints, 12);

        assert!(matches!(
            parse_sessions("<html>"),
            Err(PlayerMakerError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_metric_values_conversion() {
        let values = metric_values(&session(75, 6420.5, 7.5));
        assert_eq!(values.minutes_played, 75);
        assert_eq!(values.distance_km, Some(6.42));
        assert_eq!(values.top_speed_kmh, Some(27.0));
        assert_eq!(values.goals, 0);
        assert!(values.check().is_ok());
    }

    #[test]
    fn test_metric_values_clamped() {
        let values = metric_values(&session(300, 90_000.0, 30.0));
        assert_eq!(values.minutes_played, 130);
        assert_eq!(values.distance_km, Some(30.0));
        assert_eq!(values.top_speed_kmh, Some(45.0));
        assert!(values.check().is_ok());
    }

    #[test]
    fn test_retry_classification() {
        let server = PlayerMakerError::Http {
            status: 503,
            body: String::new(),
        };
        let client_err = PlayerMakerError::Http {
            status: 401,
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert!(!client_err.is_retryable());
        assert!(!PlayerMakerError::PlayerNotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_sync_report_counts_duplicates_as_skipped() {
        let mut report = SyncReport::default();
        // new session, already stored session, new session
        for imported in [true, false, true] {
            report.record(imported);
        }
        assert_eq!(
            report,
            SyncReport {
                imported: 2,
                skipped: 1
            }
        );
    }
}
