//! Identity-provider session verification settings.
//!
//! Sessions are issued by the external identity provider as HS256-signed
//! JWTs. The service only verifies them.
//!
//! - `IDENTITY_JWT_SECRET`: shared signing secret
//! - `IDENTITY_ISSUER`: expected `iss` claim (checked when set)
//! - `IDENTITY_AUDIENCE`: expected `aud` claim (checked when set)
//! - `IDENTITY_LEEWAY_SECS`: clock skew tolerance for `exp` (default 30)
//! - `IDENTITY_SESSION_COOKIE`: cookie name carrying the session (default `__session`)

use crate::{non_empty, parse_or};

#[derive(Clone, Debug)]
pub struct IdentityConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_secs: u64,
    pub session_cookie: String,
}

impl IdentityConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            secret: non_empty(&lookup, "IDENTITY_JWT_SECRET")
                .unwrap_or_else(|| "dev-identity-secret-change-me".to_string()),
            issuer: non_empty(&lookup, "IDENTITY_ISSUER"),
            audience: non_empty(&lookup, "IDENTITY_AUDIENCE"),
            leeway_secs: parse_or(&lookup, "IDENTITY_LEEWAY_SECS", 30),
            session_cookie: non_empty(&lookup, "IDENTITY_SESSION_COOKIE")
                .unwrap_or_else(|| "__session".to_string()),
        }
    }

    /// Configuration with a fixed secret and no issuer/audience checks.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: None,
            audience: None,
            leeway_secs: 0,
            session_cookie: "__session".to_string(),
        }
    }
}
