use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::performance::{
    CreateMetricRequest, DateRange, LeaderboardEntry, LeaderboardStat, MetricSource, MetricValues,
    PerformanceMetric, PlayerSummary, UpdateMetricRequest, METRIC_COLUMNS,
};
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct PerformanceService {
    pool: DbPool,
}

/// Everything needed to store one metric row.
pub struct NewMetric<'a> {
    pub player_id: Uuid,
    pub match_id: Option<Uuid>,
    pub recorded_on: NaiveDate,
    pub values: &'a MetricValues,
    pub source: MetricSource,
    pub external_id: Option<&'a str>,
}

/// Rows sharing a (player, external id) pair are imported once; NULL
/// external ids never conflict.
fn insert_metric_sql() -> String {
    format!(
        r#"
        INSERT INTO performance_metrics (
            id, player_id, match_id, recorded_on, minutes_played, goals, assists, shots,
            shots_on_target, passes_attempted, passes_completed, tackles, interceptions,
            saves, distance_km, top_speed_kmh, rating, source, external_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        ON CONFLICT (player_id, external_id) DO NOTHING
        RETURNING {METRIC_COLUMNS}
        "#
    )
}

impl PerformanceService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_metric(
        &self,
        request: CreateMetricRequest,
    ) -> Result<PerformanceMetric, ApiError> {
        request.values.check().map_err(ApiError::ValidationError)?;

        self.insert(NewMetric {
            player_id: request.player_id,
            match_id: request.match_id,
            recorded_on: request.recorded_on,
            values: &request.values,
            source: MetricSource::Manual,
            external_id: None,
        })
        .await
    }

    /// Inserts a metric that cannot collide (no external id).
    pub async fn insert(&self, metric: NewMetric<'_>) -> Result<PerformanceMetric, ApiError> {
        self.insert_if_new(metric)
            .await?
            .ok_or_else(|| ApiError::conflict("Metric already imported"))
    }

    /// Inserts a metric unless one with the same external id is already stored
    /// for the player, in which case `None` is returned.
    pub async fn insert_if_new(
        &self,
        metric: NewMetric<'_>,
    ) -> Result<Option<PerformanceMetric>, ApiError> {
        let v = metric.values;
        let created = sqlx::query_as::<_, PerformanceMetric>(&insert_metric_sql())
            .bind(Uuid::new_v4())
            .bind(metric.player_id)
            .bind(metric.match_id)
            .bind(metric.recorded_on)
            .bind(v.minutes_played)
            .bind(v.goals)
            .bind(v.assists)
            .bind(v.shots)
            .bind(v.shots_on_target)
            .bind(v.passes_attempted)
            .bind(v.passes_completed)
            .bind(v.tackles)
            .bind(v.interceptions)
            .bind(v.saves)
            .bind(v.distance_km)
            .bind(v.top_speed_kmh)
            .bind(v.rating)
            .bind(metric.source)
            .bind(metric.external_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(created) = &created {
            info!(
                metric_id = %created.id,
                player_id = %created.player_id,
                source = ?created.source,
                "Performance metric recorded"
            );
        }

        Ok(created)
    }

    pub async fn get_metric(&self, metric_id: Uuid) -> Result<PerformanceMetric, ApiError> {
        sqlx::query_as::<_, PerformanceMetric>(&format!(
            "SELECT {METRIC_COLUMNS} FROM performance_metrics WHERE id = $1"
        ))
        .bind(metric_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    pub async fn update_metric(
        &self,
        metric_id: Uuid,
        request: UpdateMetricRequest,
    ) -> Result<PerformanceMetric, ApiError> {
        let current = self.get_metric(metric_id).await?;
        let v = request.merged_values(&current);
        v.check().map_err(ApiError::ValidationError)?;

        let updated = sqlx::query_as::<_, PerformanceMetric>(&format!(
            r#"
            UPDATE performance_metrics
            SET match_id = $1, recorded_on = $2, minutes_played = $3, goals = $4, assists = $5,
                shots = $6, shots_on_target = $7, passes_attempted = $8, passes_completed = $9,
                tackles = $10, interceptions = $11, saves = $12, distance_km = $13,
                top_speed_kmh = $14, rating = $15
            WHERE id = $16
            RETURNING {METRIC_COLUMNS}
            "#
        ))
        .bind(request.merged_match_id(&current))
        .bind(request.recorded_on.unwrap_or(current.recorded_on))
        .bind(v.minutes_played)
        .bind(v.goals)
        .bind(v.assists)
        .bind(v.shots)
        .bind(v.shots_on_target)
        .bind(v.passes_attempted)
        .bind(v.passes_completed)
        .bind(v.tackles)
        .bind(v.interceptions)
        .bind(v.saves)
        .bind(v.distance_km)
        .bind(v.top_speed_kmh)
        .bind(v.rating)
        .bind(metric_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn delete_metric(&self, metric_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM performance_metrics WHERE id = $1")
            .bind(metric_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    pub async fn list_for_player(
        &self,
        player_id: Uuid,
        range: &DateRange,
    ) -> Result<Vec<PerformanceMetric>, ApiError> {
        range.check().map_err(ApiError::ValidationError)?;

        let metrics = sqlx::query_as::<_, PerformanceMetric>(&format!(
            r#"
            SELECT {METRIC_COLUMNS}
            FROM performance_metrics
            WHERE player_id = $1
              AND ($2::date IS NULL OR recorded_on >= $2)
              AND ($3::date IS NULL OR recorded_on <= $3)
            ORDER BY recorded_on DESC, created_at DESC
            "#
        ))
        .bind(player_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(metrics)
    }

    pub async fn recent_for_player(
        &self,
        player_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PerformanceMetric>, ApiError> {
        let metrics = sqlx::query_as::<_, PerformanceMetric>(&format!(
            r#"
            SELECT {METRIC_COLUMNS}
            FROM performance_metrics
            WHERE player_id = $1
            ORDER BY recorded_on DESC, created_at DESC
            LIMIT $2
            "#
        ))
        .bind(player_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(metrics)
    }

    pub async fn player_summary(
        &self,
        player_id: Uuid,
        range: &DateRange,
    ) -> Result<PlayerSummary, ApiError> {
        let metrics = self.list_for_player(player_id, range).await?;
        Ok(PlayerSummary::from_metrics(&metrics))
    }

    pub async fn team_leaderboard(
        &self,
        team_id: Uuid,
        stat: LeaderboardStat,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let aggregate = stat.aggregate_sql();
        let entries = sqlx::query_as::<_, LeaderboardEntry>(&format!(
            r#"
            SELECT p.id AS player_id,
                   p.first_name || ' ' || p.last_name AS player_name,
                   {aggregate} AS value
            FROM players p
            LEFT JOIN performance_metrics m ON m.player_id = p.id
            WHERE p.team_id = $1 AND p.active
            GROUP BY p.id, p.first_name, p.last_name
            ORDER BY value DESC NULLS LAST, player_name ASC
            LIMIT $2
            "#
        ))
        .bind(team_id)
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_skips_known_external_ids() {
        let sql = insert_metric_sql();
        assert!(sql.contains("ON CONFLICT (player_id, external_id) DO NOTHING"));
        assert!(sql.contains("RETURNING id, player_id"));
    }
}
