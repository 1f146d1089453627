//! Role gate.
//!
//! [`authorize`] is the single check; the `Require*` extractors wrap it so
//! a handler's signature states which roles may call it:
//!
//! ```rust,ignore
//! pub async fn create_course(
//!     State(state): State<AppState>,
//!     RequireAdmin(current): RequireAdmin,
//!     ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
//! ) -> Result<(StatusCode, Json<CourseDto>), AppError> { ... }
//! ```

use axum::extract::FromRequestParts;
use registrar_core::AppError;
use registrar_models::{Labeled, UserRole};

/// Permit when `role` is one of `allowed`, else 403.
pub fn authorize(role: UserRole, allowed: &[UserRole]) -> Result<(), AppError> {
    if allowed.contains(&role) {
        return Ok(());
    }

    let required = allowed
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(AppError::forbidden(format!(
        "Access denied. Required role: {}",
        required
    )))
}

macro_rules! require_role {
    ($name:ident, [$($role:ident),+ $(,)?]) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::CurrentUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = registrar_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let current =
                    $crate::middleware::auth::CurrentUser::from_request_parts(parts, state)
                        .await?;
                authorize(current.role(), &[$(UserRole::$role),+])?;
                Ok($name(current))
            }
        }
    };
}

require_role!(RequireAdmin, [Admin]);
require_role!(RequireTeacher, [Teacher]);
require_role!(RequireStudent, [Student]);
require_role!(RequireParent, [Parent]);
require_role!(RequireStaff, [Teacher, Admin]);
require_role!(RequireAdminOrStudent, [Admin, Student]);
