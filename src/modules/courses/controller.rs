use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::{AppError, Paginated};
use registrar_models::{CourseId, EnrollmentId};

use crate::middleware::auth::CurrentUser;
use crate::middleware::role::{RequireAdmin, RequireStaff};
use crate::modules::courses::model::{
    CourseDto, CourseFilterParams, CourseStudentDto, CreateCourseDto, EnrollStudentDto, Enrollment,
    UpdateCourseDto, UpdateEnrollmentStatusDto,
};
use crate::modules::courses::service::CourseService;
use crate::state::AppState;
use crate::utils::access::ensure_teaches_course;
use crate::utils::response::MessageResponse;
use crate::validator::{ApiPath, ApiQuery, ValidatedJson};

#[utoipa::path(
    get,
    path = "/api/courses",
    summary = "List courses",
    params(CourseFilterParams),
    responses(
        (status = 200, description = "Paginated courses", body = Paginated<CourseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _current))]
pub async fn list_courses(
    State(state): State<AppState>,
    _current: CurrentUser,
    ApiQuery(filters): ApiQuery<CourseFilterParams>,
) -> Result<Json<Paginated<CourseDto>>, AppError> {
    Ok(Json(CourseService::list_courses(&state.db, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    summary = "Get course",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course", body = CourseDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _current))]
pub async fn get_course(
    State(state): State<AppState>,
    _current: CurrentUser,
    ApiPath(id): ApiPath<CourseId>,
) -> Result<Json<CourseDto>, AppError> {
    let course = CourseService::get_course(&state.db, id).await?;
    Ok(Json(course.into()))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    summary = "Create course",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = CourseDto),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 409, description = "Code already in use, or unknown department or teacher")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<CourseDto>), AppError> {
    let course = CourseService::create_course(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(course.into())))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    summary = "Update course",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = CourseDto),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Code already in use")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_course(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CourseId>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<CourseDto>, AppError> {
    let course = CourseService::update_course(&state.db, id, dto).await?;
    Ok(Json(course.into()))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    summary = "Delete course",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_course(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CourseId>,
) -> Result<Json<MessageResponse>, AppError> {
    CourseService::delete_course(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Course deleted successfully")))
}

/// Enroll a student
///
/// `semester_id` defaults to the active semester.
#[utoipa::path(
    post,
    path = "/api/courses/{id}/enrollments",
    summary = "Enroll student in course",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = EnrollStudentDto,
    responses(
        (status = 201, description = "Student enrolled", body = Enrollment),
        (status = 400, description = "No semester given and none is active"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Course, student or semester not found"),
        (status = 409, description = "Already enrolled, course full or closed")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn enroll_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CourseId>,
    ValidatedJson(dto): ValidatedJson<EnrollStudentDto>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let enrollment = CourseService::enroll_student(&state.db, id, &dto).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    patch,
    path = "/api/courses/{id}/enrollments/{enrollment_id}",
    summary = "Change enrollment status",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
        ("enrollment_id" = Uuid, Path, description = "Enrollment ID")
    ),
    request_body = UpdateEnrollmentStatusDto,
    responses(
        (status = 200, description = "Enrollment updated", body = Enrollment),
        (status = 400, description = "Invalid status"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Course or enrollment not found"),
        (status = 409, description = "Reinstating into a full course")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_enrollment_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath((id, enrollment_id)): ApiPath<(CourseId, EnrollmentId)>,
    ValidatedJson(dto): ValidatedJson<UpdateEnrollmentStatusDto>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment =
        CourseService::update_enrollment_status(&state.db, id, enrollment_id, dto.status).await?;
    Ok(Json(enrollment))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/students",
    summary = "List students in course",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrolled students with their grades", body = Vec<CourseStudentDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an admin or the course's teacher"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn list_course_students(
    State(state): State<AppState>,
    RequireStaff(current): RequireStaff,
    ApiPath(id): ApiPath<CourseId>,
) -> Result<Json<Vec<CourseStudentDto>>, AppError> {
    ensure_teaches_course(&state.db, &current, id).await?;
    let rows = CourseService::list_course_students(&state.db, id).await?;
    Ok(Json(rows.into_iter().map(CourseStudentDto::from).collect()))
}
