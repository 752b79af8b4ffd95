use actix_web::{web, HttpResponse, Responder};
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::auth::middleware::AuthUser;
use crate::http::AppState;
use crate::models::course::{
    CourseFilter, CreateCourseRequest, CreateLessonRequest, UpdateCourseRequest,
    UpdateLessonRequest,
};

/// POST /api/courses
pub async fn create_course(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreateCourseRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    info!(user_id = %user.id, title = %request.title, "Create course request");

    let course = state.courses.create_course(user.id, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(course))
}

/// GET /api/courses
pub async fn list_courses(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<CourseFilter>,
) -> Result<impl Responder, ApiError> {
    Ok(HttpResponse::Ok().json(state.courses.list_courses(user.role, &query).await?))
}

/// GET /api/courses/{id}
pub async fn get_course(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let detail = state
        .courses
        .course_detail(path.into_inner(), user.role)
        .await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// PATCH /api/courses/{id}
pub async fn update_course(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateCourseRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let course = state
        .courses
        .update_course(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(course))
}

/// DELETE /api/courses/{id}
pub async fn delete_course(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.courses.delete_course(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/courses/{id}/lessons
pub async fn add_lesson(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<CreateLessonRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let lesson = state
        .courses
        .add_lesson(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(lesson))
}

/// PATCH /api/lessons/{id}
pub async fn update_lesson(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateLessonRequest>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    let lesson = state
        .courses
        .update_lesson(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(lesson))
}

/// DELETE /api/lessons/{id}
pub async fn delete_lesson(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    user.require_staff()?;
    state.courses.delete_lesson(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/lessons/{id}/complete
pub async fn complete_lesson(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let progress = state
        .courses
        .complete_lesson(user.id, user.role, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}

/// GET /api/courses/{id}/progress
pub async fn progress(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let progress = state
        .courses
        .progress(user.id, user.role, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}

/// POST /api/courses/{id}/certificate
pub async fn issue_certificate(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let course_id = path.into_inner();
    info!(user_id = %user.id, course_id = %course_id, "Certificate request");

    let certificate = state
        .courses
        .issue_certificate(user.id, user.role, course_id)
        .await?;
    Ok(HttpResponse::Ok().json(certificate))
}

/// GET /api/courses/{id}/certificate
pub async fn render_certificate(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let rendered = state
        .courses
        .render_certificate(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(rendered))
}

/// GET /api/certificates/verify/{code} (public)
pub async fn verify_certificate(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let verification = state
        .courses
        .verify(&path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(verification))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/courses", web::post().to(create_course))
        .route("/courses", web::get().to(list_courses))
        .route("/courses/{id}", web::get().to(get_course))
        .route("/courses/{id}", web::patch().to(update_course))
        .route("/courses/{id}", web::delete().to(delete_course))
        .route("/courses/{id}/lessons", web::post().to(add_lesson))
        .route("/courses/{id}/progress", web::get().to(progress))
        .route("/courses/{id}/certificate", web::post().to(issue_certificate))
        .route("/courses/{id}/certificate", web::get().to(render_certificate))
        .route("/lessons/{id}", web::patch().to(update_lesson))
        .route("/lessons/{id}", web::delete().to(delete_lesson))
        .route("/lessons/{id}/complete", web::post().to(complete_lesson));
}
