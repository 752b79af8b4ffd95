use crate::analysis::geo::{session_stats, SessionStats};
use crate::analysis::heatmap::{self, Heatmap};
use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::gps::{
    GpsSample, GpsSession, GpsSource, PitchBounds, UploadSessionRequest, GPS_SESSION_COLUMNS,
};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct GpsService {
    pool: DbPool,
}

fn started_at(samples: &[GpsSample]) -> Result<DateTime<Utc>, ApiError> {
    let first = samples
        .iter()
        .map(|s| s.t)
        .filter(|t| t.is_finite())
        .fold(f64::INFINITY, f64::min);

    if !first.is_finite() {
        return Err(ApiError::validation("Session has no valid timestamps"));
    }
    DateTime::from_timestamp(first.floor() as i64, 0)
        .ok_or_else(|| ApiError::validation("Session timestamp out of range"))
}

impl GpsService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn upload_session(
        &self,
        player_id: Uuid,
        request: UploadSessionRequest,
    ) -> Result<GpsSession, ApiError> {
        request.validate()?;
        let stats = session_stats(&request.samples);
        self.insert_session(
            player_id,
            GpsSource::Upload,
            request.external_id.as_deref(),
            &request.samples,
            &stats,
        )
        .await
    }

    pub async fn insert_session(
        &self,
        player_id: Uuid,
        source: GpsSource,
        external_id: Option<&str>,
        samples: &[GpsSample],
        stats: &SessionStats,
    ) -> Result<GpsSession, ApiError> {
        let started = started_at(samples)?;

        let session = sqlx::query_as::<_, GpsSession>(&format!(
            r#"
            INSERT INTO gps_sessions (id, player_id, source, external_id, started_at, samples,
                                      total_distance_m, max_speed_kmh, sprint_count,
                                      high_intensity_distance_m)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {GPS_SESSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(player_id)
        .bind(source)
        .bind(external_id)
        .bind(started)
        .bind(Json(samples))
        .bind(stats.total_distance_m)
        .bind(stats.max_speed_kmh)
        .bind(stats.sprint_count as i32)
        .bind(stats.high_intensity_distance_m)
        .fetch_one(&self.pool)
        .await?;

        info!(
            session_id = %session.id,
            player_id = %player_id,
            distance_m = stats.total_distance_m,
            sprints = stats.sprint_count,
            "GPS session stored"
        );

        Ok(session)
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<GpsSession, ApiError> {
        sqlx::query_as::<_, GpsSession>(&format!(
            "SELECT {GPS_SESSION_COLUMNS} FROM gps_sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    pub async fn list_sessions(&self, player_id: Uuid) -> Result<Vec<GpsSession>, ApiError> {
        let sessions = sqlx::query_as::<_, GpsSession>(&format!(
            r#"
            SELECT {GPS_SESSION_COLUMNS}
            FROM gps_sessions
            WHERE player_id = $1
            ORDER BY started_at DESC
            "#
        ))
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    pub async fn session_heatmap(
        &self,
        session_id: Uuid,
        bounds: PitchBounds,
        cols: usize,
        rows: usize,
    ) -> Result<Heatmap, ApiError> {
        let session = self.get_session(session_id).await?;
        let points = heatmap::project(&session.samples.0, bounds)?;
        Ok(heatmap::heatmap(&points, cols, rows)?)
    }

    pub async fn delete_session(&self, session_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM gps_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_at_uses_earliest_sample() {
        let samples = [
            GpsSample { t: 1_700_000_100.5, lat: 0.0, lon: 0.0 },
            GpsSample { t: 1_700_000_000.9, lat: 0.0, lon: 0.0 },
        ];
        let started = started_at(&samples).unwrap();
        assert_eq!(started.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_started_at_rejects_missing_timestamps() {
        let samples = [GpsSample { t: f64::NAN, lat: 0.0, lon: 0.0 }];
        assert!(matches!(started_at(&samples), Err(ApiError::ValidationError(_))));
    }
}
