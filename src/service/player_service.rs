use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::player::{
    CreatePlayerRequest, GuardianLink, LinkGuardianRequest, Player, PlayerFilter, PreferredFoot,
    UpdatePlayerRequest, PLAYER_COLUMNS,
};
use crate::models::user::Role;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct PlayerService {
    pool: DbPool,
}

impl PlayerService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_player(&self, request: CreatePlayerRequest) -> Result<Player, ApiError> {
        request.validate()?;

        if request.date_of_birth > Utc::now().date_naive() {
            return Err(ApiError::validation("date_of_birth cannot be in the future"));
        }

        let player = sqlx::query_as::<_, Player>(&format!(
            r#"
            INSERT INTO players (
                id, first_name, last_name, date_of_birth, position, preferred_foot,
                jersey_number, team_id, user_id, playermaker_id, photo_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PLAYER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.first_name.trim())
        .bind(request.last_name.trim())
        .bind(request.date_of_birth)
        .bind(request.position)
        .bind(request.preferred_foot.unwrap_or(PreferredFoot::Right))
        .bind(request.jersey_number)
        .bind(request.team_id)
        .bind(request.user_id)
        .bind(request.playermaker_id.as_deref().map(str::trim))
        .bind(request.photo_url)
        .fetch_one(&self.pool)
        .await?;

        info!(player_id = %player.id, name = %player.full_name(), "Player created");

        Ok(player)
    }

    pub async fn get_player(&self, player_id: Uuid) -> Result<Player, ApiError> {
        sqlx::query_as::<_, Player>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"
        ))
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    pub async fn list_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>, ApiError> {
        let players = sqlx::query_as::<_, Player>(&format!(
            r#"
            SELECT {PLAYER_COLUMNS}
            FROM players
            WHERE ($1::uuid IS NULL OR team_id = $1)
              AND ($2::player_position IS NULL OR position = $2)
              AND ($3::boolean IS NULL OR active = $3)
              AND ($4::text IS NULL OR (first_name || ' ' || last_name) ILIKE $4)
            ORDER BY last_name, first_name
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(filter.team_id)
        .bind(filter.position)
        .bind(filter.active)
        .bind(filter.search_pattern())
        .bind(filter.limit())
        .bind(filter.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(players)
    }

    pub async fn update_player(
        &self,
        player_id: Uuid,
        request: UpdatePlayerRequest,
    ) -> Result<Player, ApiError> {
        request.validate()?;

        let current = self.get_player(player_id).await?;
        let next = request.apply(current);

        let player = sqlx::query_as::<_, Player>(&format!(
            r#"
            UPDATE players
            SET first_name = $1, last_name = $2, date_of_birth = $3, position = $4,
                preferred_foot = $5, jersey_number = $6, team_id = $7,
                playermaker_id = $8, photo_url = $9, active = $10, updated_at = $11
            WHERE id = $12
            RETURNING {PLAYER_COLUMNS}
            "#
        ))
        .bind(next.first_name)
        .bind(next.last_name)
        .bind(next.date_of_birth)
        .bind(next.position)
        .bind(next.preferred_foot)
        .bind(next.jersey_number)
        .bind(next.team_id)
        .bind(next.playermaker_id)
        .bind(next.photo_url)
        .bind(next.active)
        .bind(Utc::now())
        .bind(player_id)
        .fetch_one(&self.pool)
        .await?;

        info!(player_id = %player_id, "Player updated");

        Ok(player)
    }

    pub async fn delete_player(&self, player_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(player_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }

        info!(player_id = %player_id, "Player deleted");
        Ok(())
    }

    pub async fn link_guardian(
        &self,
        player_id: Uuid,
        request: LinkGuardianRequest,
    ) -> Result<GuardianLink, ApiError> {
        request.validate()?;
        self.get_player(player_id).await?;

        let role: Option<Role> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(request.parent_id)
            .fetch_optional(&self.pool)
            .await?;
        if role != Some(Role::Parent) {
            return Err(ApiError::bad_request("parent_id must reference a parent account"));
        }

        let link = sqlx::query_as::<_, GuardianLink>(
            r#"
            INSERT INTO guardian_links (parent_id, player_id, relationship)
            VALUES ($1, $2, $3)
            ON CONFLICT (parent_id, player_id) DO UPDATE SET relationship = EXCLUDED.relationship
            RETURNING parent_id, player_id, relationship, created_at
            "#,
        )
        .bind(request.parent_id)
        .bind(player_id)
        .bind(request.relationship.trim())
        .fetch_one(&self.pool)
        .await?;

        info!(player_id = %player_id, parent_id = %request.parent_id, "Guardian linked");

        Ok(link)
    }

    pub async fn unlink_guardian(&self, player_id: Uuid, parent_id: Uuid) -> Result<(), ApiError> {
        let result =
            sqlx::query("DELETE FROM guardian_links WHERE player_id = $1 AND parent_id = $2")
                .bind(player_id)
                .bind(parent_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    pub async fn guardians_of(&self, player_id: Uuid) -> Result<Vec<GuardianLink>, ApiError> {
        let links = sqlx::query_as::<_, GuardianLink>(
            r#"
            SELECT parent_id, player_id, relationship, created_at
            FROM guardian_links WHERE player_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }

    pub async fn children_of(&self, parent_id: Uuid) -> Result<Vec<Player>, ApiError> {
        let columns = PLAYER_COLUMNS
            .split(',')
            .map(|c| format!("p.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");

        let players = sqlx::query_as::<_, Player>(&format!(
            r#"
            SELECT {columns}
            FROM players p
            JOIN guardian_links g ON g.player_id = p.id
            WHERE g.parent_id = $1
            ORDER BY p.first_name
            "#
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(players)
    }

    pub async fn is_guardian(&self, parent_id: Uuid, player_id: Uuid) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM guardian_links WHERE parent_id = $1 AND player_id = $2)",
        )
        .bind(parent_id)
        .bind(player_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Whether the caller may read this player's records. Staff see everyone,
    /// parents see their children, players see themselves.
    pub async fn can_view(&self, viewer_id: Uuid, role: Role, player: &Player) -> Result<bool, ApiError> {
        match role {
            Role::Admin | Role::Coach => Ok(true),
            Role::Parent => self.is_guardian(viewer_id, player.id).await,
            Role::Player => Ok(player.user_id == Some(viewer_id)),
        }
    }

    pub async fn ensure_can_view(
        &self,
        viewer_id: Uuid,
        role: Role,
        player_id: Uuid,
    ) -> Result<Player, ApiError> {
        let player = self.get_player(player_id).await?;
        if self.can_view(viewer_id, role, &player).await? {
            Ok(player)
        } else {
            Err(ApiError::Forbidden)
        }
    }
}
