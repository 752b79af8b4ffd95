use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::match_model::{
    CreateMatchRequest, Match, MatchFilter, MatchStatus, RecordResultRequest, UpdateMatchRequest,
    MATCH_COLUMNS,
};
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct MatchService {
    pool: DbPool,
}

impl MatchService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_match(&self, request: CreateMatchRequest) -> Result<Match, ApiError> {
        request.validate()?;

        let created = sqlx::query_as::<_, Match>(&format!(
            r#"
            INSERT INTO matches (id, team_id, opponent, match_date, venue, is_home, competition, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MATCH_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.team_id)
        .bind(request.opponent.trim())
        .bind(request.match_date)
        .bind(request.venue)
        .bind(request.is_home.unwrap_or(true))
        .bind(request.competition)
        .bind(MatchStatus::Scheduled)
        .fetch_one(&self.pool)
        .await?;

        info!(match_id = %created.id, team_id = %created.team_id, opponent = %created.opponent, "Match scheduled");

        Ok(created)
    }

    pub async fn get_match(&self, match_id: Uuid) -> Result<Match, ApiError> {
        sqlx::query_as::<_, Match>(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound)
    }

    pub async fn list_matches(&self, filter: &MatchFilter) -> Result<Vec<Match>, ApiError> {
        let matches = sqlx::query_as::<_, Match>(&format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            WHERE ($1::uuid IS NULL OR team_id = $1)
              AND ($2::match_status IS NULL OR status = $2)
            ORDER BY match_date DESC
            "#
        ))
        .bind(filter.team_id)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }

    pub async fn upcoming_for_team(
        &self,
        team_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Match>, ApiError> {
        let matches = sqlx::query_as::<_, Match>(&format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            WHERE team_id = $1 AND status = $2 AND match_date >= $3
            ORDER BY match_date ASC
            LIMIT $4
            "#
        ))
        .bind(team_id)
        .bind(MatchStatus::Scheduled)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }

    /// Completed matches of a team against an opponent, most recent first.
    pub async fn head_to_head(&self, team_id: Uuid, opponent: &str) -> Result<Vec<Match>, ApiError> {
        let matches = sqlx::query_as::<_, Match>(&format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            WHERE team_id = $1 AND status = $2 AND LOWER(opponent) = LOWER($3)
            ORDER BY match_date DESC
            "#
        ))
        .bind(team_id)
        .bind(MatchStatus::Completed)
        .bind(opponent.trim())
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }

    pub async fn update_match(
        &self,
        match_id: Uuid,
        request: UpdateMatchRequest,
    ) -> Result<Match, ApiError> {
        request.validate()?;

        let current = self.get_match(match_id).await?;
        let was_completed = current.status == MatchStatus::Completed;
        let next = request.apply(current);
        if next.status == MatchStatus::Completed && !was_completed {
            return Err(ApiError::bad_request(
                "Use the result endpoint to complete a match",
            ));
        }

        let updated = sqlx::query_as::<_, Match>(&format!(
            r#"
            UPDATE matches
            SET opponent = $1, match_date = $2, venue = $3, is_home = $4, competition = $5, status = $6
            WHERE id = $7
            RETURNING {MATCH_COLUMNS}
            "#
        ))
        .bind(next.opponent)
        .bind(next.match_date)
        .bind(next.venue)
        .bind(next.is_home)
        .bind(next.competition)
        .bind(next.status)
        .bind(match_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn record_result(
        &self,
        match_id: Uuid,
        request: RecordResultRequest,
    ) -> Result<Match, ApiError> {
        request.validate()?;

        let current = self.get_match(match_id).await?;
        if current.status == MatchStatus::Cancelled {
            return Err(ApiError::conflict("Cannot record a result for a cancelled match"));
        }

        let updated = sqlx::query_as::<_, Match>(&format!(
            r#"
            UPDATE matches
            SET goals_for = $1, goals_against = $2, status = $3
            WHERE id = $4
            RETURNING {MATCH_COLUMNS}
            "#
        ))
        .bind(request.goals_for)
        .bind(request.goals_against)
        .bind(MatchStatus::Completed)
        .bind(match_id)
        .fetch_one(&self.pool)
        .await?;

        info!(
            match_id = %match_id,
            score = %format!("{}-{}", request.goals_for, request.goals_against),
            "Match result recorded"
        );

        Ok(updated)
    }

    pub async fn delete_match(&self, match_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(match_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}
