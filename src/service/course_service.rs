use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, SubsecRound, Utc};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::course::{
    Certificate, CertificateVerification, Course, CourseDetail, CourseFilter, CourseProgress,
    CreateCourseRequest, CreateLessonRequest, Lesson, RenderedCertificate, UpdateCourseRequest,
    UpdateLessonRequest, CERTIFICATE_COLUMNS, COURSE_COLUMNS, LESSON_COLUMNS,
};
use crate::models::user::Role;

const CODE_LENGTH: usize = 12;

/// First 12 hex characters of SHA-256 over `user|course|issued_at`, upper-case.
pub fn verification_code(user_id: Uuid, course_id: Uuid, issued_at: DateTime<Utc>) -> String {
    let digest = Sha256::digest(format!("{}|{}|{}", user_id, course_id, issued_at.to_rfc3339()));
    let hex = format!("{:x}", digest);
    hex[..CODE_LENGTH].to_uppercase()
}

pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn render_certificate_svg(
    academy: &str,
    recipient: &str,
    course_title: &str,
    issued_at: DateTime<Utc>,
    code: &str,
) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="1000" height="700" viewBox="0 0 1000 700">
<rect x="0" y="0" width="1000" height="700" fill="#fdfbf5"/>
<rect x="30" y="30" width="940" height="640" fill="none" stroke="#1b5e20" stroke-width="6"/>
<text x="500" y="140" text-anchor="middle" font-family="Georgia, serif" font-size="40" fill="#1b5e20">{academy}</text>
<text x="500" y="220" text-anchor="middle" font-family="Georgia, serif" font-size="30">Certificate of Completion</text>
<text x="500" y="300" text-anchor="middle" font-family="Helvetica, sans-serif" font-size="20">This certifies that</text>
<text x="500" y="370" text-anchor="middle" font-family="Georgia, serif" font-size="44">{recipient}</text>
<text x="500" y="440" text-anchor="middle" font-family="Helvetica, sans-serif" font-size="20">has completed the course</text>
<text x="500" y="500" text-anchor="middle" font-family="Georgia, serif" font-size="32">{course}</text>
<text x="500" y="590" text-anchor="middle" font-family="Helvetica, sans-serif" font-size="18">Issued {date}</text>
<text x="500" y="630" text-anchor="middle" font-family="monospace" font-size="16" fill="#555555">Verification code {code}</text>
</svg>"##,
        academy = xml_escape(academy),
        recipient = xml_escape(recipient),
        course = xml_escape(course_title),
        date = issued_at.format("%d %B %Y"),
        code = xml_escape(code),
    )
}

pub fn svg_data_url(svg: &str) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        general_purpose::STANDARD.encode(svg.as_bytes())
    )
}

#[derive(Clone)]
pub struct CourseService {
    pool: DbPool,
    academy_name: String,
}

impl CourseService {
    pub fn new(pool: DbPool, academy_name: String) -> Self {
        Self { pool, academy_name }
    }

    pub async fn create_course(
        &self,
        created_by: Uuid,
        request: CreateCourseRequest,
    ) -> Result<Course, ApiError> {
        request.validate()?;

        let course = sqlx::query_as::<_, Course>(&format!(
            r#"
            INSERT INTO courses (id, title, description, audience, published, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.title.trim())
        .bind(request.description)
        .bind(request.audience)
        .bind(request.published)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        info!(course_id = %course.id, title = %course.title, "Course created");
        Ok(course)
    }

    /// Unpublished courses read as missing for non-staff callers.
    pub async fn get_course(&self, course_id: Uuid, role: Role) -> Result<Course, ApiError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)?;

        if course.visible_to(role) {
            Ok(course)
        } else {
            Err(ApiError::NotFound)
        }
    }

    pub async fn course_detail(&self, course_id: Uuid, role: Role) -> Result<CourseDetail, ApiError> {
        let course = self.get_course(course_id, role).await?;
        let lessons = self.list_lessons(course_id).await?;
        Ok(CourseDetail { course, lessons })
    }

    pub async fn list_courses(&self, role: Role, filter: &CourseFilter) -> Result<Vec<Course>, ApiError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            r#"
            SELECT {COURSE_COLUMNS}
            FROM courses
            WHERE ($1 OR published) AND ($2::course_audience IS NULL OR audience = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(role.is_staff())
        .bind(filter.audience)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    pub async fn update_course(
        &self,
        course_id: Uuid,
        request: UpdateCourseRequest,
    ) -> Result<Course, ApiError> {
        request.validate()?;

        sqlx::query_as::<_, Course>(&format!(
            r#"
            UPDATE courses SET
                title = COALESCE($2, title),
                description = CASE WHEN $6 THEN $3 ELSE description END,
                audience = COALESCE($4, audience),
                published = COALESCE($5, published),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(course_id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(request.description.clone().flatten())
        .bind(request.audience)
        .bind(request.published)
        .bind(request.description.is_some())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    pub async fn delete_course(&self, course_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        info!(course_id = %course_id, "Course deleted");
        Ok(())
    }

    pub async fn add_lesson(
        &self,
        course_id: Uuid,
        request: CreateLessonRequest,
    ) -> Result<Lesson, ApiError> {
        request.validate()?;
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(ApiError::NotFound);
        }

        let position = match request.position {
            Some(position) => position,
            None => {
                let last: i32 = sqlx::query_scalar(
                    "SELECT COALESCE(MAX(position), 0) FROM lessons WHERE course_id = $1",
                )
                .bind(course_id)
                .fetch_one(&mut *tx)
                .await?;
                last + 1
            }
        };

        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            r#"
            INSERT INTO lessons (id, course_id, title, content, position, duration_minutes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(request.title.trim())
        .bind(request.content)
        .bind(position)
        .bind(request.duration_minutes.unwrap_or(0))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(lesson)
    }

    pub async fn list_lessons(&self, course_id: Uuid) -> Result<Vec<Lesson>, ApiError> {
        let lessons = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = $1 ORDER BY position, created_at"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lessons)
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> Result<Lesson, ApiError> {
        sqlx::query_as::<_, Lesson>(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"))
            .bind(lesson_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound)
    }

    pub async fn update_lesson(
        &self,
        lesson_id: Uuid,
        request: UpdateLessonRequest,
    ) -> Result<Lesson, ApiError> {
        request.validate()?;

        sqlx::query_as::<_, Lesson>(&format!(
            r#"
            UPDATE lessons SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                position = COALESCE($4, position),
                duration_minutes = COALESCE($5, duration_minutes)
            WHERE id = $1
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(lesson_id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(request.content)
        .bind(request.position)
        .bind(request.duration_minutes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    pub async fn delete_lesson(&self, lesson_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(lesson_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    /// Marks a lesson done for the caller. Repeats are no-ops.
    pub async fn complete_lesson(
        &self,
        user_id: Uuid,
        role: Role,
        lesson_id: Uuid,
    ) -> Result<CourseProgress, ApiError> {
        let lesson = self.get_lesson(lesson_id).await?;
        self.get_course(lesson.course_id, role).await?;

        sqlx::query(
            r#"
            INSERT INTO lesson_completions (user_id, lesson_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .execute(&self.pool)
        .await?;

        self.progress(user_id, role, lesson.course_id).await
    }

    pub async fn progress(
        &self,
        user_id: Uuid,
        role: Role,
        course_id: Uuid,
    ) -> Result<CourseProgress, ApiError> {
        self.get_course(course_id, role).await?;

        let (completed, total): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(c.lesson_id), COUNT(l.id)
            FROM lessons l
            LEFT JOIN lesson_completions c ON c.lesson_id = l.id AND c.user_id = $2
            WHERE l.course_id = $1
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(CourseProgress::new(course_id, completed, total))
    }

    /// Issues the caller's certificate once every lesson is complete.
    /// Asking again returns the certificate already issued.
    pub async fn issue_certificate(
        &self,
        user_id: Uuid,
        role: Role,
        course_id: Uuid,
    ) -> Result<Certificate, ApiError> {
        if let Some(existing) = self.find_certificate(user_id, course_id).await? {
            return Ok(existing);
        }

        let progress = self.progress(user_id, role, course_id).await?;
        if !progress.is_complete() {
            return Err(ApiError::conflict(format!(
                "Course is {}% complete; all lessons must be finished",
                progress.percent
            )));
        }

        // Stored timestamps lose sub-second precision, so the code is computed
        // from the truncated value.
        let issued_at = Utc::now().trunc_subsecs(0);
        let code = verification_code(user_id, course_id, issued_at);

        sqlx::query(
            r#"
            INSERT INTO certificates (id, user_id, course_id, issued_at, verification_code)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, course_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(course_id)
        .bind(issued_at)
        .bind(&code)
        .execute(&self.pool)
        .await?;

        let certificate = self
            .find_certificate(user_id, course_id)
            .await?
            .ok_or_else(|| ApiError::internal_error("certificate missing after insert"))?;

        info!(user_id = %user_id, course_id = %course_id, code = %certificate.verification_code, "Certificate issued");
        Ok(certificate)
    }

    async fn find_certificate(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Certificate>, ApiError> {
        let certificate = sqlx::query_as::<_, Certificate>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE user_id = $1 AND course_id = $2"
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(certificate)
    }

    pub async fn render_certificate(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<RenderedCertificate, ApiError> {
        let certificate = self
            .find_certificate(user_id, course_id)
            .await?
            .ok_or(ApiError::NotFound)?;
        let details = self
            .verify(&certificate.verification_code)
            .await?
            .ok_or(ApiError::NotFound)?;

        let svg = render_certificate_svg(
            &self.academy_name,
            &details.recipient_name,
            &details.course_title,
            certificate.issued_at,
            &certificate.verification_code,
        );
        let data_url = svg_data_url(&svg);

        Ok(RenderedCertificate {
            certificate,
            svg,
            data_url,
        })
    }

    pub async fn verify(&self, code: &str) -> Result<Option<CertificateVerification>, ApiError> {
        let verification = sqlx::query_as::<_, CertificateVerification>(
            r#"
            SELECT c.verification_code, u.full_name AS recipient_name, co.title AS course_title, c.issued_at
            FROM certificates c
            JOIN users u ON u.id = c.user_id
            JOIN courses co ON co.id = c.course_id
            WHERE c.verification_code = $1
            "#,
        )
        .bind(code.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_verification_code_shape() {
        let issued = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let user = Uuid::from_u128(1);
        let course = Uuid::from_u128(2);

        let code = verification_code(user, course, issued);
        assert_eq!(code.len(), 12);
        assert!(code.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));

        let raw = format!("{}|{}|{}", user, course, "2025-06-01T12:00:00+00:00");
        let expected = format!("{:x}", Sha256::digest(raw))[..12].to_uppercase();
        assert_eq!(code, expected);
    }

    #[test]
    fn test_verification_code_changes_with_inputs() {
        let issued = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let a = verification_code(Uuid::from_u128(1), Uuid::from_u128(2), issued);
        let b = verification_code(Uuid::from_u128(3), Uuid::from_u128(2), issued);
        assert_ne!(a, b);
    }

    #[test]
    fn test_svg_escapes_text() {
        let issued = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let svg = render_certificate_svg(
            "Smith & Sons <Academy>",
            "O'Neil \"Jr\"",
            "Coaching U9s",
            issued,
            "ABC123DEF456",
        );
        assert!(svg.contains("Smith &amp; Sons &lt;Academy&gt;"));
        assert!(svg.contains("O&apos;Neil &quot;Jr&quot;"));
        assert!(svg.contains("Issued 01 June 2025"));
        assert!(!svg.contains("<Academy>"));
    }

    #[test]
    fn test_data_url() {
        let url = svg_data_url("<svg/>");
        assert_eq!(url, "data:image/svg+xml;base64,PHN2Zy8+");
    }
}
