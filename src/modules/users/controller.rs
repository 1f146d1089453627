use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::{AppError, Paginated};
use registrar_models::UserId;

use crate::middleware::role::RequireAdmin;
use crate::modules::users::model::{CreateUserDto, UpdateUserStatusDto, UserDto, UserFilterParams};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::response::MessageResponse;
use crate::validator::{ApiPath, ApiQuery, ValidatedJson};

/// Create a user
///
/// Binds an external identity to a new user. Students and teachers get
/// their profile row in the same transaction.
#[utoipa::path(
    post,
    path = "/api/users",
    summary = "Create user",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 409, description = "Identity, email or student number already in use")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto), fields(admin_id = %admin.id()))]
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<UserDto>), AppError> {
    let user = UserService::create_user(&state.db, dto, &state.academic_config).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/api/users",
    summary = "List users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Paginated users", body = Paginated<UserDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(filters): ApiQuery<UserFilterParams>,
) -> Result<Json<Paginated<UserDto>>, AppError> {
    let users = UserService::list_users(&state.db, &filters).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    summary = "Get user",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<UserDto>, AppError> {
    let user = UserService::get_user(&state.db, id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    summary = "Change user status",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserStatusDto,
    responses(
        (status = 200, description = "Status updated", body = UserDto),
        (status = 400, description = "Invalid status, or deactivating yourself"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto), fields(admin_id = %admin.id()))]
pub async fn update_user_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateUserStatusDto>,
) -> Result<Json<UserDto>, AppError> {
    let user = UserService::update_status(&state.db, admin.id(), id, dto.status).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    summary = "Delete user",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Deleting yourself"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin), fields(admin_id = %admin.id()))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::delete_user(&state.db, admin.id(), id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
