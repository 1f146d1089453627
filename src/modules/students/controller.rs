use axum::{Json, extract::State};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::{AppError, Paginated};
use registrar_models::StudentId;

use crate::middleware::auth::CurrentUser;
use crate::middleware::role::{RequireAdmin, RequireStaff};
use crate::modules::students::model::{
    StudentDto, StudentFilterParams, StudentSummary, UpdateStudentDto,
};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::utils::access::{ensure_student_visible, record_scope};
use crate::validator::{ApiPath, ApiQuery, ValidatedJson};

/// List students
///
/// Admins see every student; teachers see students enrolled in their courses.
#[utoipa::path(
    get,
    path = "/api/students",
    summary = "List students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Paginated students", body = Paginated<StudentDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires teacher or admin role")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn list_students(
    State(state): State<AppState>,
    RequireStaff(current): RequireStaff,
    ApiQuery(filters): ApiQuery<StudentFilterParams>,
) -> Result<Json<Paginated<StudentDto>>, AppError> {
    let scope = record_scope(&state.db, &current).await?;
    let students = StudentService::list_students(&state.db, &scope, &filters).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    summary = "Get student",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student", body = StudentDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the student, a linked parent, or one of their teachers"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn get_student(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<StudentId>,
) -> Result<Json<StudentDto>, AppError> {
    ensure_student_visible(&state.db, &current, id).await?;
    let student = StudentService::get_student(&state.db, id).await?;
    Ok(Json(student.into()))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    summary = "Update student",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateStudentDto,
    responses(
        (status = 200, description = "Student updated", body = StudentDto),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Student number already in use")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<StudentId>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<StudentDto>, AppError> {
    let student = StudentService::update_student(&state.db, id, dto).await?;
    Ok(Json(student.into()))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/summary",
    summary = "Student academic summary",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Averages, pass rate and progress", body = StudentSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the student, a linked parent, or one of their teachers"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn get_student_summary(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<StudentId>,
) -> Result<Json<StudentSummary>, AppError> {
    ensure_student_visible(&state.db, &current, id).await?;
    let summary = StudentService::get_summary(&state.db, id, &state.academic_config).await?;
    Ok(Json(summary))
}
