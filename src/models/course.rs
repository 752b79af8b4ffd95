use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::nullable;
use crate::models::user::Role;

pub const COURSE_COLUMNS: &str =
    "id, title, description, audience, published, created_by, created_at, updated_at";
pub const LESSON_COLUMNS: &str =
    "id, course_id, title, content, position, duration_minutes, created_at";
pub const CERTIFICATE_COLUMNS: &str = "id, user_id, course_id, issued_at, verification_code";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "course_audience", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseAudience {
    Coach,
    Parent,
    Player,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub audience: CourseAudience,
    pub published: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Drafts are visible to staff only.
    pub fn visible_to(&self, role: Role) -> bool {
        self.published || role.is_staff()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: String,
    pub position: i32,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Certificate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub verification_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub audience: CourseAudience,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 4000))]
    pub description: Option<Option<String>>,
    pub audience: Option<CourseAudience>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseFilter {
    pub audience: Option<CourseAudience>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    /// Defaults to the end of the course.
    #[validate(range(min = 1))]
    pub position: Option<i32>,
    #[validate(range(min = 0, max = 600))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    #[validate(range(min = 1))]
    pub position: Option<i32>,
    #[validate(range(min = 0, max = 600))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseProgress {
    pub course_id: Uuid,
    pub completed: i64,
    pub total: i64,
    pub percent: f64,
}

impl CourseProgress {
    pub fn new(course_id: Uuid, completed: i64, total: i64) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            ((completed as f64 / total as f64) * 1000.0).round() / 10.0
        };
        Self {
            course_id,
            completed,
            total,
            percent,
        }
    }

    /// A course with no lessons is never complete.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedCertificate {
    #[serde(flatten)]
    pub certificate: Certificate,
    pub svg: String,
    pub data_url: String,
}

/// Public answer to a verification lookup.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CertificateVerification {
    pub verification_code: String,
    pub recipient_name: String,
    pub course_title: String,
    pub issued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        let progress = CourseProgress::new(Uuid::nil(), 1, 3);
        assert_eq!(progress.percent, 33.3);
        assert!(!progress.is_complete());

        let done = CourseProgress::new(Uuid::nil(), 4, 4);
        assert_eq!(done.percent, 100.0);
        assert!(done.is_complete());
    }

    #[test]
    fn test_empty_course_progress() {
        let progress = CourseProgress::new(Uuid::nil(), 0, 0);
        assert_eq!(progress.percent, 0.0);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_lesson_validation() {
        let request = CreateLessonRequest {
            title: String::new(),
            content: "Body shape when receiving".to_string(),
            position: Some(0),
            duration_minutes: Some(15),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(errors.field_errors().contains_key("position"));
    }

    #[test]
    fn test_course_patch_clears_description() {
        let request: UpdateCourseRequest =
            serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(request.description, Some(None));

        let too_long = UpdateCourseRequest {
            description: Some(Some("x".repeat(4001))),
            ..Default::default()
        };
        assert!(too_long.validate().is_err());
    }
}
