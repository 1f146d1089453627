use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::AppError;
use registrar_models::SemesterId;

use crate::middleware::auth::CurrentUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::semesters::model::{CreateSemesterDto, Semester, UpdateSemesterDto};
use crate::modules::semesters::service::SemesterService;
use crate::state::AppState;
use crate::utils::response::MessageResponse;
use crate::validator::{ApiPath, ValidatedJson};

#[utoipa::path(
    get,
    path = "/api/semesters",
    summary = "List semesters",
    responses(
        (status = 200, description = "All semesters, newest first", body = Vec<Semester>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Semesters",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _current))]
pub async fn list_semesters(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<Semester>>, AppError> {
    Ok(Json(SemesterService::list_semesters(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/semesters/active",
    summary = "Get the active semester",
    responses(
        (status = 200, description = "The active semester", body = Semester),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No semester is active")
    ),
    tag = "Semesters",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _current))]
pub async fn get_active_semester(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Semester>, AppError> {
    Ok(Json(SemesterService::get_active(&state.db).await?))
}

/// Create a semester
///
/// With `is_active: true` the new semester becomes the only active one.
#[utoipa::path(
    post,
    path = "/api/semesters",
    summary = "Create semester",
    request_body = CreateSemesterDto,
    responses(
        (status = 201, description = "Semester created", body = Semester),
        (status = 400, description = "Invalid input or date range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 409, description = "Name already in use")
    ),
    tag = "Semesters",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_semester(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateSemesterDto>,
) -> Result<(StatusCode, Json<Semester>), AppError> {
    let semester = SemesterService::create_semester(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(semester)))
}

#[utoipa::path(
    put,
    path = "/api/semesters/{id}",
    summary = "Update semester",
    params(("id" = Uuid, Path, description = "Semester ID")),
    request_body = UpdateSemesterDto,
    responses(
        (status = 200, description = "Semester updated", body = Semester),
        (status = 400, description = "Invalid input or date range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Semester not found"),
        (status = 409, description = "Name already in use")
    ),
    tag = "Semesters",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_semester(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<SemesterId>,
    ValidatedJson(dto): ValidatedJson<UpdateSemesterDto>,
) -> Result<Json<Semester>, AppError> {
    Ok(Json(SemesterService::update_semester(&state.db, id, dto).await?))
}

#[utoipa::path(
    post,
    path = "/api/semesters/{id}/activate",
    summary = "Activate semester",
    params(("id" = Uuid, Path, description = "Semester ID")),
    responses(
        (status = 200, description = "Semester is now the only active one", body = Semester),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Semester not found")
    ),
    tag = "Semesters",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn activate_semester(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<SemesterId>,
) -> Result<Json<Semester>, AppError> {
    Ok(Json(SemesterService::activate_semester(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/semesters/{id}",
    summary = "Delete semester",
    params(("id" = Uuid, Path, description = "Semester ID")),
    responses(
        (status = 200, description = "Semester deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Semester not found"),
        (status = 409, description = "Semester is active or has enrollments or grades")
    ),
    tag = "Semesters",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_semester(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<SemesterId>,
) -> Result<Json<MessageResponse>, AppError> {
    SemesterService::delete_semester(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Semester deleted successfully")))
}
