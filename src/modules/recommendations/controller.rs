use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use registrar_core::{AppError, Paginated};
use registrar_models::RecommendationId;

use crate::middleware::auth::CurrentUser;
use crate::middleware::role::{RequireAdminOrStudent, RequireStudent, RequireTeacher};
use crate::modules::recommendations::model::{
    CreateRecommendationDto, DeclineRecommendationDto, RecommendationDto,
    RecommendationFilterParams, RecommendationStatus, SubmitRecommendationDto,
};
use crate::modules::recommendations::service::RecommendationService;
use crate::state::AppState;
use crate::utils::access::record_scope;
use crate::utils::response::MessageResponse;
use crate::validator::{ApiPath, ApiQuery, ValidatedJson};

/// List recommendation requests
///
/// Admins see all, teachers the requests addressed to them, students their
/// own and parents their children's.
#[utoipa::path(
    get,
    path = "/api/recommendations",
    summary = "List recommendations",
    params(RecommendationFilterParams),
    responses(
        (status = 200, description = "Paginated recommendation requests", body = Paginated<RecommendationDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Recommendations",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn list_recommendations(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(filters): ApiQuery<RecommendationFilterParams>,
) -> Result<Json<Paginated<RecommendationDto>>, AppError> {
    let scope = record_scope(&state.db, &current).await?;
    let rows = RecommendationService::list_recommendations(&state.db, &scope, &filters).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/recommendations",
    summary = "Request a recommendation",
    request_body = CreateRecommendationDto,
    responses(
        (status = 201, description = "Request created", body = RecommendationDto),
        (status = 400, description = "Invalid input, past deadline or inactive teacher"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires student role"),
        (status = 404, description = "Teacher not found")
    ),
    tag = "Recommendations",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current, dto), fields(user_id = %current.id()))]
pub async fn create_recommendation(
    State(state): State<AppState>,
    RequireStudent(current): RequireStudent,
    ValidatedJson(dto): ValidatedJson<CreateRecommendationDto>,
) -> Result<(StatusCode, Json<RecommendationDto>), AppError> {
    let student_id = current.student_id()?;
    let recommendation = RecommendationService::create_recommendation(
        &state.db,
        student_id,
        dto,
        Utc::now().date_naive(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(recommendation.into())))
}

#[utoipa::path(
    post,
    path = "/api/recommendations/{id}/submit",
    summary = "Submit recommendation letter",
    params(("id" = Uuid, Path, description = "Recommendation ID")),
    request_body = SubmitRecommendationDto,
    responses(
        (status = 200, description = "Letter submitted", body = RecommendationDto),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the addressed teacher"),
        (status = 404, description = "Recommendation not found"),
        (status = 409, description = "Request is no longer pending")
    ),
    tag = "Recommendations",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current, dto), fields(user_id = %current.id()))]
pub async fn submit_recommendation(
    State(state): State<AppState>,
    RequireTeacher(current): RequireTeacher,
    ApiPath(id): ApiPath<RecommendationId>,
    ValidatedJson(dto): ValidatedJson<SubmitRecommendationDto>,
) -> Result<Json<RecommendationDto>, AppError> {
    let teacher_id = current.teacher_id()?;
    let recommendation =
        RecommendationService::submit(&state.db, id, teacher_id, &dto.content).await?;
    Ok(Json(recommendation.into()))
}

#[utoipa::path(
    post,
    path = "/api/recommendations/{id}/decline",
    summary = "Decline recommendation request",
    params(("id" = Uuid, Path, description = "Recommendation ID")),
    request_body = DeclineRecommendationDto,
    responses(
        (status = 200, description = "Request declined", body = RecommendationDto),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the addressed teacher"),
        (status = 404, description = "Recommendation not found"),
        (status = 409, description = "Request is no longer pending")
    ),
    tag = "Recommendations",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current, dto), fields(user_id = %current.id()))]
pub async fn decline_recommendation(
    State(state): State<AppState>,
    RequireTeacher(current): RequireTeacher,
    ApiPath(id): ApiPath<RecommendationId>,
    ValidatedJson(dto): ValidatedJson<DeclineRecommendationDto>,
) -> Result<Json<RecommendationDto>, AppError> {
    let teacher_id = current.teacher_id()?;
    let recommendation =
        RecommendationService::decline(&state.db, id, teacher_id, dto.reason.as_deref()).await?;
    Ok(Json(recommendation.into()))
}

#[utoipa::path(
    delete,
    path = "/api/recommendations/{id}",
    summary = "Delete recommendation request",
    params(("id" = Uuid, Path, description = "Recommendation ID")),
    responses(
        (status = 200, description = "Request deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the requesting student or an admin"),
        (status = 404, description = "Recommendation not found"),
        (status = 409, description = "Students can only withdraw pending requests")
    ),
    tag = "Recommendations",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn delete_recommendation(
    State(state): State<AppState>,
    RequireAdminOrStudent(current): RequireAdminOrStudent,
    ApiPath(id): ApiPath<RecommendationId>,
) -> Result<Json<MessageResponse>, AppError> {
    let recommendation = RecommendationService::get_recommendation(&state.db, id).await?;

    if !current.is_admin() {
        if current.student_id != Some(recommendation.student_id) {
            return Err(AppError::forbidden("You did not request this recommendation"));
        }
        if recommendation.status != RecommendationStatus::Pending {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Only pending requests can be withdrawn"
            )));
        }
    }

    RecommendationService::delete_recommendation(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Recommendation deleted successfully")))
}
