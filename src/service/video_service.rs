use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::patch::merge;
use crate::models::video::{
    CreateEventRequest, CreateVideoRequest, EventSource, EventSummary, NewVideoEvent,
    UpdateVideoRequest, Video, VideoEvent, VideoFilter, VIDEO_COLUMNS, VIDEO_EVENT_COLUMNS,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct VideoService {
    pool: DbPool,
}

/// Events must fall inside the clip.
pub fn within_duration(timestamp_seconds: f64, duration_seconds: i32) -> bool {
    timestamp_seconds.is_finite()
        && timestamp_seconds >= 0.0
        && timestamp_seconds <= f64::from(duration_seconds)
}

impl VideoService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_video(
        &self,
        uploaded_by: Uuid,
        request: CreateVideoRequest,
    ) -> Result<Video, ApiError> {
        request.validate()?;

        let video = sqlx::query_as::<_, Video>(&format!(
            r#"
            INSERT INTO videos (id, title, url, team_id, match_id, duration_seconds, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.title.trim())
        .bind(&request.url)
        .bind(request.team_id)
        .bind(request.match_id)
        .bind(request.duration_seconds)
        .bind(uploaded_by)
        .fetch_one(&self.pool)
        .await?;

        info!(video_id = %video.id, title = %video.title, "Video registered");

        Ok(video)
    }

    pub async fn get_video(&self, video_id: Uuid) -> Result<Video, ApiError> {
        sqlx::query_as::<_, Video>(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"))
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound)
    }

    pub async fn list_videos(&self, filter: &VideoFilter) -> Result<Vec<Video>, ApiError> {
        let videos = sqlx::query_as::<_, Video>(&format!(
            r#"
            SELECT {VIDEO_COLUMNS}
            FROM videos
            WHERE ($1::uuid IS NULL OR team_id = $1)
              AND ($2::uuid IS NULL OR match_id = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.team_id)
        .bind(filter.match_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    pub async fn update_video(
        &self,
        video_id: Uuid,
        request: UpdateVideoRequest,
    ) -> Result<Video, ApiError> {
        request.validate()?;
        let current = self.get_video(video_id).await?;

        let duration = request.duration_seconds.unwrap_or(current.duration_seconds);
        if duration < current.duration_seconds {
            let beyond: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM video_events WHERE video_id = $1 AND timestamp_seconds > $2)",
            )
            .bind(video_id)
            .bind(f64::from(duration))
            .fetch_one(&self.pool)
            .await?;
            if beyond {
                return Err(ApiError::conflict(
                    "Video has events after the new duration",
                ));
            }
        }

        let updated = sqlx::query_as::<_, Video>(&format!(
            r#"
            UPDATE videos
            SET title = $1, url = $2, team_id = $3, match_id = $4, duration_seconds = $5
            WHERE id = $6
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(request.title.unwrap_or(current.title))
        .bind(request.url.unwrap_or(current.url))
        .bind(merge(request.team_id, current.team_id))
        .bind(merge(request.match_id, current.match_id))
        .bind(duration)
        .bind(video_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn delete_video(&self, video_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    pub async fn add_manual_event(
        &self,
        video_id: Uuid,
        request: CreateEventRequest,
    ) -> Result<VideoEvent, ApiError> {
        request.validate()?;
        let video = self.get_video(video_id).await?;
        if !within_duration(request.timestamp_seconds, video.duration_seconds) {
            return Err(ApiError::validation(format!(
                "timestamp_seconds must be between 0 and {}",
                video.duration_seconds
            )));
        }

        let mut stored = self
            .insert_events(
                video_id,
                vec![NewVideoEvent {
                    timestamp_seconds: request.timestamp_seconds,
                    event_type: request.event_type,
                    player_id: request.player_id,
                    note: request.note,
                    source: EventSource::Manual,
                    confidence: None,
                }],
            )
            .await?;

        stored.pop().ok_or(ApiError::InternalServerError)
    }

    pub async fn insert_events(
        &self,
        video_id: Uuid,
        events: Vec<NewVideoEvent>,
    ) -> Result<Vec<VideoEvent>, ApiError> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(events.len());

        for event in events {
            let row = sqlx::query_as::<_, VideoEvent>(&format!(
                r#"
                INSERT INTO video_events (id, video_id, timestamp_seconds, event_type, player_id,
                                          note, source, confidence)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {VIDEO_EVENT_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(video_id)
            .bind(event.timestamp_seconds)
            .bind(event.event_type)
            .bind(event.player_id)
            .bind(event.note)
            .bind(event.source)
            .bind(event.confidence)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;
        Ok(stored)
    }

    pub async fn list_events(&self, video_id: Uuid) -> Result<Vec<VideoEvent>, ApiError> {
        let events = sqlx::query_as::<_, VideoEvent>(&format!(
            r#"
            SELECT {VIDEO_EVENT_COLUMNS}
            FROM video_events
            WHERE video_id = $1
            ORDER BY timestamp_seconds ASC, created_at ASC
            "#
        ))
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn event_summary(&self, video_id: Uuid) -> Result<EventSummary, ApiError> {
        self.get_video(video_id).await?;
        let events = self.list_events(video_id).await?;
        Ok(EventSummary::from_events(&events))
    }

    pub async fn delete_event(&self, video_id: Uuid, event_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM video_events WHERE id = $1 AND video_id = $2")
            .bind(event_id)
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}
