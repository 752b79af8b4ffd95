use crate::analysis::pitch::{self, clamp_drawings, clamp_markers, layout_for_shape};
use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::patch::merge;
use crate::models::tactics::{
    CreateBoardRequest, CreateFormationRequest, Formation, Marker, TacticalBoard,
    UpdateBoardRequest, UpdateFormationRequest, BOARD_COLUMNS, FORMATION_COLUMNS,
};
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct TacticsService {
    pool: DbPool,
}

impl TacticsService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_formation(
        &self,
        created_by: Uuid,
        request: CreateFormationRequest,
    ) -> Result<Formation, ApiError> {
        request.validate()?;

        let shape = request.shape.trim().to_string();
        pitch::parse_shape(&shape)?;
        let mut markers = match request.markers {
            Some(markers) if !markers.is_empty() => markers,
            _ => layout_for_shape(&shape)?,
        };
        clamp_markers(&mut markers);

        let formation = sqlx::query_as::<_, Formation>(&format!(
            r#"
            INSERT INTO formations (id, name, shape, team_id, created_by, markers)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {FORMATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(&shape)
        .bind(request.team_id)
        .bind(created_by)
        .bind(Json(&markers))
        .fetch_one(&self.pool)
        .await?;

        info!(formation_id = %formation.id, shape = %formation.shape, "Formation created");

        Ok(formation)
    }

    pub async fn get_formation(&self, formation_id: Uuid) -> Result<Formation, ApiError> {
        sqlx::query_as::<_, Formation>(&format!(
            "SELECT {FORMATION_COLUMNS} FROM formations WHERE id = $1"
        ))
        .bind(formation_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    pub async fn list_formations(&self, team_id: Option<Uuid>) -> Result<Vec<Formation>, ApiError> {
        let formations = sqlx::query_as::<_, Formation>(&format!(
            r#"
            SELECT {FORMATION_COLUMNS}
            FROM formations
            WHERE ($1::uuid IS NULL OR team_id = $1)
            ORDER BY updated_at DESC
            "#
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(formations)
    }

    pub async fn update_formation(
        &self,
        formation_id: Uuid,
        request: UpdateFormationRequest,
    ) -> Result<Formation, ApiError> {
        request.validate()?;
        let current = self.get_formation(formation_id).await?;

        let mut markers = request.markers.unwrap_or(current.markers.0);
        clamp_markers(&mut markers);

        let updated = sqlx::query_as::<_, Formation>(&format!(
            r#"
            UPDATE formations
            SET name = $1, team_id = $2, markers = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {FORMATION_COLUMNS}
            "#
        ))
        .bind(request.name.unwrap_or(current.name))
        .bind(merge(request.team_id, current.team_id))
        .bind(Json(&markers))
        .bind(formation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn delete_formation(&self, formation_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM formations WHERE id = $1")
            .bind(formation_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    /// Markers for a new board: copied from a formation, generated from a
    /// shape, or taken as posted, in that order of precedence.
    async fn initial_markers(&self, request: &CreateBoardRequest) -> Result<Vec<Marker>, ApiError> {
        if let Some(formation_id) = request.formation_id {
            let formation = self.get_formation(formation_id).await?;
            return Ok(formation.markers.0);
        }
        if let Some(shape) = request.shape.as_deref() {
            return Ok(layout_for_shape(shape)?);
        }
        Ok(request.markers.clone())
    }

    pub async fn create_board(
        &self,
        created_by: Uuid,
        request: CreateBoardRequest,
    ) -> Result<TacticalBoard, ApiError> {
        request.validate()?;

        let mut markers = self.initial_markers(&request).await?;
        clamp_markers(&mut markers);
        let mut drawings = request.drawings;
        clamp_drawings(&mut drawings);

        let board = sqlx::query_as::<_, TacticalBoard>(&format!(
            r#"
            INSERT INTO tactical_boards (id, name, formation_id, created_by, markers, drawings,
                                         canvas_width, canvas_height, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {BOARD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(request.formation_id)
        .bind(created_by)
        .bind(Json(&markers))
        .bind(Json(&drawings))
        .bind(request.canvas_width)
        .bind(request.canvas_height)
        .bind(request.notes)
        .fetch_one(&self.pool)
        .await?;

        info!(board_id = %board.id, markers = markers.len(), "Tactical board created");

        Ok(board)
    }

    pub async fn get_board(&self, board_id: Uuid) -> Result<TacticalBoard, ApiError> {
        sqlx::query_as::<_, TacticalBoard>(&format!(
            "SELECT {BOARD_COLUMNS} FROM tactical_boards WHERE id = $1"
        ))
        .bind(board_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    pub async fn list_boards(&self, created_by: Option<Uuid>) -> Result<Vec<TacticalBoard>, ApiError> {
        let boards = sqlx::query_as::<_, TacticalBoard>(&format!(
            r#"
            SELECT {BOARD_COLUMNS}
            FROM tactical_boards
            WHERE ($1::uuid IS NULL OR created_by = $1)
            ORDER BY updated_at DESC
            "#
        ))
        .bind(created_by)
        .fetch_all(&self.pool)
        .await?;

        Ok(boards)
    }

    pub async fn update_board(
        &self,
        board_id: Uuid,
        request: UpdateBoardRequest,
    ) -> Result<TacticalBoard, ApiError> {
        request.validate()?;
        let current = self.get_board(board_id).await?;

        let mut markers = request.markers.unwrap_or(current.markers.0);
        clamp_markers(&mut markers);
        let mut drawings = request.drawings.unwrap_or(current.drawings.0);
        clamp_drawings(&mut drawings);

        let updated = sqlx::query_as::<_, TacticalBoard>(&format!(
            r#"
            UPDATE tactical_boards
            SET name = $1, markers = $2, drawings = $3, canvas_width = $4, canvas_height = $5,
                notes = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING {BOARD_COLUMNS}
            "#
        ))
        .bind(request.name.unwrap_or(current.name))
        .bind(Json(&markers))
        .bind(Json(&drawings))
        .bind(request.canvas_width.unwrap_or(current.canvas_width))
        .bind(request.canvas_height.unwrap_or(current.canvas_height))
        .bind(merge(request.notes, current.notes))
        .bind(board_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn delete_board(&self, board_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM tactical_boards WHERE id = $1")
            .bind(board_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}
