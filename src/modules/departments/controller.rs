use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::AppError;
use registrar_models::DepartmentId;

use crate::middleware::auth::CurrentUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::departments::model::{
    CreateDepartmentDto, Department, DepartmentWithStats, UpdateDepartmentDto,
};
use crate::modules::departments::service::DepartmentService;
use crate::state::AppState;
use crate::utils::response::MessageResponse;
use crate::validator::{ApiPath, ValidatedJson};

#[utoipa::path(
    get,
    path = "/api/departments",
    summary = "List departments",
    responses(
        (status = 200, description = "All departments", body = Vec<Department>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _current))]
pub async fn list_departments(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<Department>>, AppError> {
    let departments = DepartmentService::list_departments(&state.db).await?;
    Ok(Json(departments))
}

#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    summary = "Get department",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department with course, teacher and student counts", body = DepartmentWithStats),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Department not found")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _current))]
pub async fn get_department(
    State(state): State<AppState>,
    _current: CurrentUser,
    ApiPath(id): ApiPath<DepartmentId>,
) -> Result<Json<DepartmentWithStats>, AppError> {
    let department = DepartmentService::get_department(&state.db, id).await?;
    Ok(Json(department))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    summary = "Create department",
    request_body = CreateDepartmentDto,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 409, description = "Code or name already in use")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_department(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateDepartmentDto>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    let department = DepartmentService::create_department(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    summary = "Update department",
    params(("id" = Uuid, Path, description = "Department ID")),
    request_body = UpdateDepartmentDto,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Code or name already in use")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_department(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<DepartmentId>,
    ValidatedJson(dto): ValidatedJson<UpdateDepartmentDto>,
) -> Result<Json<Department>, AppError> {
    let department = DepartmentService::update_department(&state.db, id, dto).await?;
    Ok(Json(department))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    summary = "Delete department",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Department still has courses")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_department(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<DepartmentId>,
) -> Result<Json<MessageResponse>, AppError> {
    DepartmentService::delete_department(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Department deleted successfully")))
}
