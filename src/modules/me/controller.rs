use axum::Json;
use tracing::instrument;

use registrar_core::AppError;
use registrar_models::users::{ProfileResponse, UserDto};

use crate::middleware::auth::CurrentUser;

/// Current user's profile
///
/// Returns the user bound to the session, with its student or teacher
/// profile id when one exists.
#[utoipa::path(
    get,
    path = "/api/me",
    summary = "Current user profile",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = ProfileResponse),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Account is not active")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
#[instrument(skip(current), fields(user_id = %current.id()))]
pub async fn get_profile(current: CurrentUser) -> Result<Json<ProfileResponse>, AppError> {
    Ok(Json(ProfileResponse {
        student_id: current.student_id,
        teacher_id: current.teacher_id,
        user: UserDto::from(current.user),
    }))
}
