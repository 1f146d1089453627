use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::{AppError, Paginated};
use registrar_models::GradeId;

use crate::middleware::auth::CurrentUser;
use crate::middleware::role::{RequireAdmin, RequireStaff};
use crate::modules::grades::model::{CreateGradeDto, Grade, GradeFilterParams, UpdateGradeDto};
use crate::modules::grades::service::GradeService;
use crate::state::AppState;
use crate::utils::access::{ensure_teaches_course, record_scope};
use crate::utils::response::MessageResponse;
use crate::validator::{ApiPath, ApiQuery, ValidatedJson};

/// List grades
///
/// Admins see every grade, teachers the grades of their courses, students
/// their own and parents their children's.
#[utoipa::path(
    get,
    path = "/api/grades",
    summary = "List grades",
    params(GradeFilterParams),
    responses(
        (status = 200, description = "Paginated grades", body = Paginated<Grade>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn list_grades(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(filters): ApiQuery<GradeFilterParams>,
) -> Result<Json<Paginated<Grade>>, AppError> {
    let scope = record_scope(&state.db, &current).await?;
    Ok(Json(GradeService::list_grades(&state.db, &scope, &filters).await?))
}

/// Record a grade
///
/// The semester defaults to the active one and the letter is derived from
/// the score when omitted.
#[utoipa::path(
    post,
    path = "/api/grades",
    summary = "Create grade",
    request_body = CreateGradeDto,
    responses(
        (status = 201, description = "Grade recorded", body = Grade),
        (status = 400, description = "Invalid input, or no semester given and none is active"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an admin or the course's teacher"),
        (status = 404, description = "Course, student or semester not found"),
        (status = 409, description = "Grade already exists for this student, course and semester")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current, dto), fields(user_id = %current.id()))]
pub async fn create_grade(
    State(state): State<AppState>,
    RequireStaff(current): RequireStaff,
    ValidatedJson(dto): ValidatedJson<CreateGradeDto>,
) -> Result<(StatusCode, Json<Grade>), AppError> {
    ensure_teaches_course(&state.db, &current, dto.course_id).await?;
    let grade = GradeService::create_grade(&state.db, current.id(), dto).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

#[utoipa::path(
    put,
    path = "/api/grades/{id}",
    summary = "Update grade",
    params(("id" = Uuid, Path, description = "Grade ID")),
    request_body = UpdateGradeDto,
    responses(
        (status = 200, description = "Grade updated", body = Grade),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an admin or the course's teacher"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current, dto), fields(user_id = %current.id()))]
pub async fn update_grade(
    State(state): State<AppState>,
    RequireStaff(current): RequireStaff,
    ApiPath(id): ApiPath<GradeId>,
    ValidatedJson(dto): ValidatedJson<UpdateGradeDto>,
) -> Result<Json<Grade>, AppError> {
    let existing = GradeService::get_grade(&state.db, id).await?;
    ensure_teaches_course(&state.db, &current, existing.course_id).await?;
    let grade = GradeService::update_grade(&state.db, id, current.id(), dto).await?;
    Ok(Json(grade))
}

#[utoipa::path(
    delete,
    path = "/api/grades/{id}",
    summary = "Delete grade",
    params(("id" = Uuid, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Grade deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_grade(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<GradeId>,
) -> Result<Json<MessageResponse>, AppError> {
    GradeService::delete_grade(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Grade deleted successfully")))
}
