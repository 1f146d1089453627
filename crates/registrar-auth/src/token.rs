//! Session token verification.
//!
//! Tokens are HS256 JWTs signed with the secret shared with the identity
//! provider. Verification checks signature and `exp` (with the configured
//! leeway), and `iss`/`aud` only when those are configured.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use registrar_config::IdentityConfig;
use registrar_core::AppError;

use crate::claims::SessionClaims;

fn validation_for(config: &IdentityConfig) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = config.leeway_secs;
    validation.set_required_spec_claims(&["exp", "sub"]);
    match &config.issuer {
        Some(issuer) => validation.set_issuer(&[issuer]),
        None => validation.iss = None,
    }
    match &config.audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }
    validation
}

/// Verify a session token and return its claims.
///
/// # Errors
///
/// Returns 401 when the token is malformed, badly signed, expired, or does
/// not match the configured issuer/audience, or when `sub` is blank.
pub fn verify_session_token(
    token: &str,
    config: &IdentityConfig,
) -> Result<SessionClaims, AppError> {
    let claims = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation_for(config),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired session"))?;

    if claims.sub.trim().is_empty() {
        return Err(AppError::unauthorized("Session has no subject"));
    }

    Ok(claims)
}

/// Mint a session token the way the identity provider would.
///
/// Used by integration tests and the `mint-token` CLI command.
pub fn issue_session_token(
    external_id: &str,
    email: Option<&str>,
    ttl_secs: i64,
    config: &IdentityConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: external_id.to_string(),
        email: email.map(str::to_string),
        iat: now,
        exp: now + ttl_secs,
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| {
        AppError::internal(anyhow::Error::new(e).context("Failed to sign session token"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IdentityConfig {
        IdentityConfig::with_secret("test-secret-key-at-least-32-characters-long")
    }

    #[test]
    fn test_issue_then_verify() {
        let config = config();
        let token = issue_session_token("user_2abc", Some("s@uni.edu"), 3600, &config).unwrap();
        let claims = verify_session_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "user_2abc");
        assert_eq!(claims.email.as_deref(), Some("s@uni.edu"));
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let err = verify_session_token("not-a-jwt", &config()).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = issue_session_token("user_1", None, 3600, &config()).unwrap();
        let other = IdentityConfig::with_secret("another-secret-key-at-least-32-characters");
        let err = verify_session_token(&token, &other).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let token = issue_session_token("user_1", None, -120, &config()).unwrap();
        assert!(verify_session_token(&token, &config()).is_err());
    }

    #[test]
    fn test_leeway_accepts_recently_expired() {
        let mut config = config();
        config.leeway_secs = 300;
        let token = issue_session_token("user_1", None, -60, &config).unwrap();
        assert!(verify_session_token(&token, &config).is_ok());
    }

    #[test]
    fn test_issuer_checked_when_configured() {
        let mut minting = config();
        minting.issuer = Some("https://other.example".to_string());
        let token = issue_session_token("user_1", None, 3600, &minting).unwrap();

        let mut verifying = config();
        verifying.issuer = Some("https://id.example".to_string());
        assert!(verify_session_token(&token, &verifying).is_err());

        // Unconfigured issuer accepts any.
        assert!(verify_session_token(&token, &config()).is_ok());
    }

    #[test]
    fn test_audience_checked_when_configured() {
        let mut config = config();
        config.audience = Some("registrar".to_string());
        let token = issue_session_token("user_1", None, 3600, &config).unwrap();
        assert!(verify_session_token(&token, &config).is_ok());

        let mut other = config.clone();
        other.audience = Some("billing".to_string());
        assert!(verify_session_token(&token, &other).is_err());
    }

    #[test]
    fn test_blank_subject_rejected() {
        let token = issue_session_token("  ", None, 3600, &config()).unwrap();
        assert!(verify_session_token(&token, &config()).is_err());
    }
}
