//! Verification of access tokens issued by the identity service.
//!
//! Tokens are HS256 JWTs whose payload decodes into [`Claims`]. A token
//! naming a role this service does not know fails to decode and is treated
//! like a bad signature.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use logbook_core::roles::Role;
use logbook_core::types::DbId;
use serde::{Deserialize, Serialize};

/// Access-token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user's id (student, teacher, or admin id).
    pub sub: DbId,
    pub role: Role,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Shared-secret settings for token verification.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,
}

const DEFAULT_LEEWAY_SECS: u64 = 60;

impl JwtConfig {
    /// Load from `JWT_SECRET` (required, non-empty) and `JWT_LEEWAY_SECS`
    /// (default `60`).
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is missing or empty, or the leeway is not a
    /// non-negative integer.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let leeway_secs = std::env::var("JWT_LEEWAY_SECS")
            .map(|v| v.parse().expect("JWT_LEEWAY_SECS must be a non-negative integer"))
            .unwrap_or(DEFAULT_LEEWAY_SECS);

        Self {
            secret,
            leeway_secs,
        }
    }
}

/// Why a bearer token was refused.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,
    #[error("Invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Decoding key and validation rules, built once at startup.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Check signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(err),
            })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(&JwtConfig {
            secret: SECRET.to_string(),
            leeway_secs: 0,
        })
    }

    fn sign(payload: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            payload,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_minutes(mins: i64) -> i64 {
        chrono::Utc::now().timestamp() + mins * 60
    }

    #[test]
    fn valid_token_yields_typed_role() {
        let token = sign(
            &serde_json::json!({ "sub": 42, "role": "college_admin", "exp": in_minutes(5) }),
            SECRET,
        );
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::CollegeAdmin);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let token = sign(
            &serde_json::json!({ "sub": 1, "role": "student", "exp": in_minutes(-5) }),
            SECRET,
        );
        assert_matches!(verifier().verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn unknown_role_is_invalid() {
        let token = sign(
            &serde_json::json!({ "sub": 1, "role": "principal", "exp": in_minutes(5) }),
            SECRET,
        );
        assert_matches!(verifier().verify(&token), Err(TokenError::Invalid(_)));
    }

    #[test]
    fn foreign_secret_is_invalid() {
        let token = sign(
            &serde_json::json!({ "sub": 1, "role": "student", "exp": in_minutes(5) }),
            "some-other-secret",
        );
        assert_matches!(verifier().verify(&token), Err(TokenError::Invalid(_)));
    }
}
