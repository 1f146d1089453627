use axum::{Json, extract::State};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::AppError;
use registrar_models::TeacherId;

use crate::middleware::auth::CurrentUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::teachers::model::{TeacherDto, TeacherFilterParams, UpdateTeacherDto};
use crate::modules::teachers::service::TeacherService;
use crate::state::AppState;
use crate::validator::{ApiPath, ApiQuery, ValidatedJson};

#[utoipa::path(
    get,
    path = "/api/teachers",
    summary = "List teachers",
    params(TeacherFilterParams),
    responses(
        (status = 200, description = "Teachers", body = Vec<TeacherDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _current))]
pub async fn list_teachers(
    State(state): State<AppState>,
    _current: CurrentUser,
    ApiQuery(filters): ApiQuery<TeacherFilterParams>,
) -> Result<Json<Vec<TeacherDto>>, AppError> {
    let teachers = TeacherService::list_teachers(&state.db, &filters).await?;
    Ok(Json(teachers.into_iter().map(TeacherDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/teachers/{id}",
    summary = "Get teacher",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher", body = TeacherDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Teacher not found")
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _current))]
pub async fn get_teacher(
    State(state): State<AppState>,
    _current: CurrentUser,
    ApiPath(id): ApiPath<TeacherId>,
) -> Result<Json<TeacherDto>, AppError> {
    let teacher = TeacherService::get_teacher(&state.db, id).await?;
    Ok(Json(teacher.into()))
}

#[utoipa::path(
    put,
    path = "/api/teachers/{id}",
    summary = "Update teacher",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    request_body = UpdateTeacherDto,
    responses(
        (status = 200, description = "Teacher updated", body = TeacherDto),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Teacher not found")
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_teacher(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<TeacherId>,
    ValidatedJson(dto): ValidatedJson<UpdateTeacherDto>,
) -> Result<Json<TeacherDto>, AppError> {
    let teacher = TeacherService::update_teacher(&state.db, id, dto).await?;
    Ok(Json(teacher.into()))
}
