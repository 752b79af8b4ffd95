use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::match_model::{Match, MatchStatus, MATCH_COLUMNS};
use crate::models::patch::merge;
use crate::models::player::{Player, PLAYER_COLUMNS};
use crate::models::team::{CreateTeamRequest, Team, TeamRecord, UpdateTeamRequest};
use crate::models::user::Role;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct TeamService {
    pool: DbPool,
}

impl TeamService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_team(&self, request: CreateTeamRequest) -> Result<Team, ApiError> {
        request.validate()?;

        if let Some(coach_id) = request.coach_id {
            self.ensure_coach(coach_id).await?;
        }

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (id, name, age_group, season, coach_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, age_group, season, coach_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(request.age_group.trim().to_uppercase())
        .bind(request.season.trim())
        .bind(request.coach_id)
        .fetch_one(&self.pool)
        .await?;

        info!(team_id = %team.id, name = %team.name, "Team created");

        Ok(team)
    }

    pub async fn get_team(&self, team_id: Uuid) -> Result<Team, ApiError> {
        sqlx::query_as::<_, Team>(
            "SELECT id, name, age_group, season, coach_id, created_at FROM teams WHERE id = $1",
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    pub async fn list_teams(&self, coach_id: Option<Uuid>) -> Result<Vec<Team>, ApiError> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, age_group, season, coach_id, created_at
            FROM teams
            WHERE ($1::uuid IS NULL OR coach_id = $1)
            ORDER BY season DESC, age_group, name
            "#,
        )
        .bind(coach_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    pub async fn update_team(
        &self,
        team_id: Uuid,
        request: UpdateTeamRequest,
    ) -> Result<Team, ApiError> {
        request.validate()?;

        let current = self.get_team(team_id).await?;
        if let Some(Some(coach_id)) = request.coach_id {
            self.ensure_coach(coach_id).await?;
        }

        let team = sqlx::query_as::<_, Team>(
            r#"
            UPDATE teams
            SET name = $1, age_group = $2, season = $3, coach_id = $4
            WHERE id = $5
            RETURNING id, name, age_group, season, coach_id, created_at
            "#,
        )
        .bind(request.name.as_deref().map(str::trim).unwrap_or(current.name.as_str()))
        .bind(
            request
                .age_group
                .map(|g| g.trim().to_uppercase())
                .unwrap_or(current.age_group),
        )
        .bind(request.season.as_deref().map(str::trim).unwrap_or(current.season.as_str()))
        .bind(merge(request.coach_id, current.coach_id))
        .bind(team_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(team)
    }

    pub async fn delete_team(&self, team_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }

        info!(team_id = %team_id, "Team deleted");
        Ok(())
    }

    pub async fn team_players(&self, team_id: Uuid) -> Result<Vec<Player>, ApiError> {
        self.get_team(team_id).await?;

        let players = sqlx::query_as::<_, Player>(&format!(
            r#"
            SELECT {PLAYER_COLUMNS}
            FROM players
            WHERE team_id = $1
            ORDER BY jersey_number NULLS LAST, last_name
            "#
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(players)
    }

    pub async fn team_record(&self, team_id: Uuid) -> Result<TeamRecord, ApiError> {
        self.get_team(team_id).await?;

        let matches = sqlx::query_as::<_, Match>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE team_id = $1 AND status = $2"
        ))
        .bind(team_id)
        .bind(MatchStatus::Completed)
        .fetch_all(&self.pool)
        .await?;

        Ok(TeamRecord::from_matches(&matches))
    }

    async fn ensure_coach(&self, user_id: Uuid) -> Result<(), ApiError> {
        let role: Option<Role> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match role {
            Some(Role::Coach) | Some(Role::Admin) => Ok(()),
            Some(_) => Err(ApiError::bad_request("coach_id must reference a coach")),
            None => Err(ApiError::bad_request("coach_id does not exist")),
        }
    }
}
