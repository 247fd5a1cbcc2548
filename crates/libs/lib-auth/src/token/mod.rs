//! # JWT Token Management
//!
//! JWT token generation, validation, and credential verification.

use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lib_utils::time::now_utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::revocation::RevokedTokens;

/// JWT Claims structure containing user authentication information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Account email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Verified account identity extracted from a valid credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
}

impl TryFrom<&Claims> for Identity {
    type Error = AuthError;

    fn try_from(claims: &Claims) -> Result<Self, AuthError> {
        let id = claims.sub.parse::<i64>().map_err(|_| AuthError::Invalid)?;
        Ok(Identity {
            id,
            email: claims.email.clone(),
        })
    }
}

/// Why a credential was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no credential provided")]
    Missing,
    #[error("credential verification failed")]
    Invalid,
    #[error("credential has been revoked")]
    Revoked,
}

/// Encode a JWT token with user claims.
pub fn encode_jwt(
    user_id: i64,
    email: String,
    secret: &str,
    expiration_hours: i64,
) -> Result<String, String> {
    let now = now_utc();
    let exp = now + Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        email,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("Failed to encode JWT: {}", e))
}

/// Decode and validate a JWT token.
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| format!("Failed to decode JWT: {}", e))?;

    Ok(token_data.claims)
}

/// Verify a bearer credential and resolve the account identity behind it.
///
/// The revocation list is consulted before signature validation: a
/// logged-out token is refused even while its signature is still valid.
pub fn verify_credential(
    credential: Option<&str>,
    secret: &str,
    revoked: &RevokedTokens,
) -> Result<Identity, AuthError> {
    let token = credential
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Missing)?;

    if revoked.is_revoked(token) {
        return Err(AuthError::Revoked);
    }

    let claims = decode_jwt(token, secret).map_err(|_| AuthError::Invalid)?;
    Identity::try_from(&claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-must-be-at-least-32-chars-long!";

    #[test]
    fn test_jwt_encoding_decoding() {
        let user_id = 1;
        let email = "test@example.com".to_string();

        let token = encode_jwt(user_id, email.clone(), SECRET, 24)
            .expect("JWT encoding should succeed");
        let claims = decode_jwt(&token, SECRET)
            .expect("JWT decoding should succeed");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, email);
    }

    #[test]
    fn test_verify_credential_resolves_identity() {
        let revoked = RevokedTokens::new();
        let token = encode_jwt(42, "dev@example.com".to_string(), SECRET, 24)
            .expect("JWT encoding should succeed");

        let identity = verify_credential(Some(&token), SECRET, &revoked)
            .expect("valid credential should verify");

        assert_eq!(identity.id, 42);
        assert_eq!(identity.email, "dev@example.com");
    }

    #[test]
    fn test_verify_credential_missing() {
        let revoked = RevokedTokens::new();

        assert_eq!(
            verify_credential(None, SECRET, &revoked),
            Err(AuthError::Missing)
        );
        assert_eq!(
            verify_credential(Some("   "), SECRET, &revoked),
            Err(AuthError::Missing)
        );
    }

    #[test]
    fn test_verify_credential_invalid_signature() {
        let revoked = RevokedTokens::new();
        let token = encode_jwt(1, "test@example.com".to_string(), SECRET, 24)
            .expect("JWT encoding should succeed");

        let result = verify_credential(Some(&token), "another-secret-also-32-characters!!", &revoked);

        assert_eq!(result, Err(AuthError::Invalid));
    }

    #[test]
    fn test_verify_credential_revoked_despite_valid_signature() {
        let revoked = RevokedTokens::new();
        let token = encode_jwt(1, "test@example.com".to_string(), SECRET, 24)
            .expect("JWT encoding should succeed");

        // Sanity: the token itself still verifies.
        assert!(decode_jwt(&token, SECRET).is_ok());

        revoked.revoke(&token, now_utc().timestamp() + 3600);

        assert_eq!(
            verify_credential(Some(&token), SECRET, &revoked),
            Err(AuthError::Revoked)
        );
    }
}
