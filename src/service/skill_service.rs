use crate::analysis::radar;
use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::skill::{
    clamp_score, RadarAxis, RecordAssessmentRequest, SkillProgress, SkillScore, SKILL_COLUMNS,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct SkillService {
    pool: DbPool,
}

impl SkillService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Stores every score of one assessment in a single transaction.
    pub async fn record_assessment(
        &self,
        player_id: Uuid,
        assessed_by: Uuid,
        request: RecordAssessmentRequest,
    ) -> Result<Vec<SkillScore>, ApiError> {
        request.validate()?;

        let mut rows = Vec::with_capacity(request.scores.len());
        for input in &request.scores {
            let skill = input.skill.trim();
            if skill.is_empty() {
                return Err(ApiError::validation("Skill name cannot be blank"));
            }
            let score = clamp_score(input.score).ok_or_else(|| {
                ApiError::validation(format!("Score for '{skill}' must be a finite number"))
            })?;
            rows.push((input.category, skill.to_string(), score, input.notes.clone()));
        }

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(rows.len());
        for (category, skill, score, notes) in rows {
            let row = sqlx::query_as::<_, SkillScore>(&format!(
                r#"
                INSERT INTO skill_scores (id, player_id, assessed_by, assessed_on, category, skill, score, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {SKILL_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(player_id)
            .bind(assessed_by)
            .bind(request.assessed_on)
            .bind(category)
            .bind(skill)
            .bind(score)
            .bind(notes)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }
        tx.commit().await?;

        info!(
            player_id = %player_id,
            assessed_by = %assessed_by,
            scores = created.len(),
            "Skill assessment recorded"
        );

        Ok(created)
    }

    pub async fn scores_for_player(&self, player_id: Uuid) -> Result<Vec<SkillScore>, ApiError> {
        let scores = sqlx::query_as::<_, SkillScore>(&format!(
            r#"
            SELECT {SKILL_COLUMNS}
            FROM skill_scores
            WHERE player_id = $1
            ORDER BY assessed_on DESC, created_at DESC
            "#
        ))
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(scores)
    }

    pub async fn profile(&self, player_id: Uuid) -> Result<Vec<SkillScore>, ApiError> {
        let scores = self.scores_for_player(player_id).await?;
        Ok(radar::latest_scores(&scores))
    }

    pub async fn radar(&self, player_id: Uuid) -> Result<Vec<RadarAxis>, ApiError> {
        let scores = self.scores_for_player(player_id).await?;
        Ok(radar::radar_axes(&scores))
    }

    pub async fn progress(&self, player_id: Uuid) -> Result<Vec<SkillProgress>, ApiError> {
        let scores = self.scores_for_player(player_id).await?;
        Ok(radar::progress(&scores))
    }

    pub async fn get_score(&self, score_id: Uuid) -> Result<SkillScore, ApiError> {
        sqlx::query_as::<_, SkillScore>(&format!(
            "SELECT {SKILL_COLUMNS} FROM skill_scores WHERE id = $1"
        ))
        .bind(score_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    pub async fn delete_score(&self, score_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM skill_scores WHERE id = $1")
            .bind(score_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}
