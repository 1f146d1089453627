//! Session resolution.
//!
//! Every `/api` route except `/api/health` sits behind [`require_session`].
//! It verifies the identity-provider token, maps its subject onto a user row
//! and stores a [`CurrentUser`] in the request extensions, where handlers
//! pick it up through the [`CurrentUser`] extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use registrar_auth::verify_session_token;
use registrar_core::AppError;
use registrar_models::{StudentId, TeacherId, User, UserId, UserRole};
use registrar_observability::track_session_rejected;

use crate::state::AppState;

/// The authenticated user with its role profile ids.
#[derive(Debug, Clone, FromRow)]
pub struct CurrentUser {
    #[sqlx(flatten)]
    pub user: User,
    pub student_id: Option<StudentId>,
    pub teacher_id: Option<TeacherId>,
}

impl CurrentUser {
    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == UserRole::Admin
    }

    /// The caller's student profile, 403 when there is none.
    pub fn student_id(&self) -> Result<StudentId, AppError> {
        self.student_id
            .ok_or_else(|| AppError::forbidden("No student profile for this account"))
    }

    /// The caller's teacher profile, 403 when there is none.
    pub fn teacher_id(&self) -> Result<TeacherId, AppError> {
        self.teacher_id
            .ok_or_else(|| AppError::forbidden("No teacher profile for this account"))
    }
}

/// Bearer token from `Authorization`, falling back to the session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|value| !value.is_empty())
}

#[instrument(skip(db))]
pub async fn resolve_user(db: &PgPool, external_id: &str) -> Result<Option<CurrentUser>, AppError> {
    let current = sqlx::query_as::<_, CurrentUser>(
        r#"SELECT u.id, u.external_id, u.email, u.first_name, u.last_name, u.role, u.status,
                  u.created_at, u.updated_at, s.id AS student_id, t.id AS teacher_id
           FROM users u
           LEFT JOIN students s ON s.user_id = u.id
           LEFT JOIN teachers t ON t.user_id = u.id
           WHERE u.external_id = $1"#,
    )
    .bind(external_id)
    .fetch_optional(db)
    .await?;

    Ok(current)
}

/// Token → claims → user. 401 for a missing or bad session or an unknown
/// identity, 403 for an account that is not active.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<CurrentUser, AppError> {
    let Some(token) = session_token(headers, &state.identity_config.session_cookie) else {
        track_session_rejected("missing");
        return Err(AppError::unauthorized("Missing session token"));
    };

    let claims = verify_session_token(&token, &state.identity_config).inspect_err(|_| {
        track_session_rejected("invalid");
    })?;

    let Some(current) = resolve_user(&state.db, &claims.sub).await? else {
        debug!(external_id = %claims.sub, "No user bound to identity");
        track_session_rejected("unknown_identity");
        return Err(AppError::unauthorized("Unknown identity"));
    };

    if !current.user.is_active() {
        track_session_rejected("inactive");
        return Err(AppError::forbidden("Account is not active"));
    }

    Ok(current)
}

/// Layer for the `/api` router.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticate(&state, req.headers()).await {
        Ok(current) => {
            req.extensions_mut().insert(current);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }

        let current = authenticate(state, &parts.headers).await?;
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header};

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_token() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(session_token(&map, "__session").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_token() {
        let map = headers(&[(header::COOKIE, "theme=dark; __session=tok123")]);
        assert_eq!(session_token(&map, "__session").as_deref(), Some("tok123"));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "__session=from-cookie"),
        ]);
        assert_eq!(session_token(&map, "__session").as_deref(), Some("from-header"));
    }

    #[test]
    fn test_no_token() {
        assert!(session_token(&HeaderMap::new(), "__session").is_none());

        let basic = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert!(session_token(&basic, "__session").is_none());

        let empty_cookie = headers(&[(header::COOKIE, "__session=")]);
        assert!(session_token(&empty_cookie, "__session").is_none());
    }

    #[test]
    fn test_custom_cookie_name() {
        let map = headers(&[(header::COOKIE, "sid=xyz")]);
        assert!(session_token(&map, "__session").is_none());
        assert_eq!(session_token(&map, "sid").as_deref(), Some("xyz"));
    }
}
