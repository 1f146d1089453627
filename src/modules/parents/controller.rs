use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use registrar_core::AppError;
use registrar_models::students::StudentDto;
use registrar_models::{StudentId, UserId};

use crate::middleware::role::{RequireAdmin, RequireParent};
use crate::modules::parents::model::{LinkChildDto, ParentLink};
use crate::modules::parents::service::ParentService;
use crate::state::AppState;
use crate::utils::response::MessageResponse;
use crate::validator::{ApiPath, ValidatedJson};

#[utoipa::path(
    post,
    path = "/api/parents/{parent_id}/children",
    summary = "Link child to parent",
    params(("parent_id" = Uuid, Path, description = "Parent user ID")),
    request_body = LinkChildDto,
    responses(
        (status = 201, description = "Child linked", body = ParentLink),
        (status = 400, description = "User is not a parent"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Parent or student not found"),
        (status = 409, description = "Already linked")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto), fields(user_id = %admin.id()))]
pub async fn link_child(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(parent_id): ApiPath<UserId>,
    ValidatedJson(dto): ValidatedJson<LinkChildDto>,
) -> Result<(StatusCode, Json<ParentLink>), AppError> {
    let link = ParentService::link_child(&state.db, parent_id, dto.student_id).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

#[utoipa::path(
    delete,
    path = "/api/parents/{parent_id}/children/{student_id}",
    summary = "Unlink child from parent",
    params(
        ("parent_id" = Uuid, Path, description = "Parent user ID"),
        ("student_id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Child unlinked", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Link not found")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin), fields(user_id = %admin.id()))]
pub async fn unlink_child(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath((parent_id, student_id)): ApiPath<(UserId, StudentId)>,
) -> Result<Json<MessageResponse>, AppError> {
    ParentService::unlink_child(&state.db, parent_id, student_id).await?;
    Ok(Json(MessageResponse::new("Child unlinked successfully")))
}

#[utoipa::path(
    get,
    path = "/api/parents/me/children",
    summary = "List my children",
    responses(
        (status = 200, description = "Students linked to the current parent", body = Vec<StudentDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires parent role")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent), fields(user_id = %parent.id()))]
pub async fn list_my_children(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
) -> Result<Json<Vec<StudentDto>>, AppError> {
    let children = ParentService::list_children(&state.db, parent.id()).await?;
    Ok(Json(children.into_iter().map(StudentDto::from).collect()))
}
