//! Claim set of an identity-provider session token.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by a session token.
///
/// `sub` is the provider's identifier for the person and is matched against
/// `users.external_id`. It is never an internal user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionClaims {
    /// External identity (subject claim)
    pub sub: String,
    /// Email address as known to the identity provider
    #[serde(default)]
    pub email: Option<String>,
    /// Issued-at timestamp (Unix seconds)
    pub iat: i64,
    /// Expiration timestamp (Unix seconds)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_deserialize_minimal() {
        let json = r#"{"sub":"user_2abc","iat":1700000000,"exp":1700003600}"#;
        let claims: SessionClaims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "user_2abc");
        assert!(claims.email.is_none());
        assert!(claims.iss.is_none());
    }

    #[test]
    fn test_claims_skip_absent_issuer() {
        let claims = SessionClaims {
            sub: "user_1".to_string(),
            email: Some("a@b.edu".to_string()),
            iat: 1,
            exp: 2,
            iss: None,
            aud: Some("registrar".to_string()),
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(!serialized.contains("iss"));
        assert!(serialized.contains(r#""aud":"registrar""#));
    }
}
