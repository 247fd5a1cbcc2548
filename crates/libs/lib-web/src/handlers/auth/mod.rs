//! # Account Handlers
//!
//! HTTP request handlers for the account lifecycle.
//!
//! ## Overview
//!
//! - Registration with email/password
//! - Login against the stored Argon2 hash
//! - Profile lookup for the authenticated account
//! - Logout, which revokes the presented token until it would have expired
//!   on its own
//!
//! Login answers the same `Invalid credentials` for an unknown email and a
//! wrong password, so the two cases cannot be told apart from outside.

use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
};
use lib_auth::{decode_jwt, encode_jwt, hash_password, verify_password, Identity, RevokedTokens};
use lib_core::model::store::UserRepository;
use lib_core::{
    dto::{
        AuthResponse, ErrorResponse, LoginRequest, MessageResponse, ProfileResponse,
        RegisterRequest, UserInfo,
    },
    Config, DbPool,
};
use lib_utils::validation::{validate_email, validate_max_length, validate_min_length};
use tracing::{debug, error, info, instrument, warn};

use crate::middleware::BearerToken;

/// Registration handler - creates a new account.
///
/// # Returns
///
/// * `Ok((StatusCode::CREATED, AuthResponse))` - Account created, token issued
/// * `Err((StatusCode, ErrorResponse))` - Validation error, duplicate email, or server error
///
/// # Validation
///
/// - Email is trimmed and lowercased, must look like an email, 6-50 characters
/// - Email must be unique
/// - Password must be at least 8 characters (enforced by `hash_password`)
#[instrument(skip(pool, config, req), fields(email = %req.email))]
pub async fn register(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("[REGISTER] NEW ACCOUNT REQUEST");

    let email = req.email.trim().to_lowercase();

    if let Err(e) = validate_email(&email)
        .and_then(|_| validate_min_length(&email, 6, "Email"))
        .and_then(|_| validate_max_length(&email, 50, "Email"))
    {
        warn!("[REGISTER] Invalid email: {}", e);
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })));
    }

    match UserRepository::find_by_email(&pool, &email).await {
        Ok(Some(_)) => {
            warn!("[REGISTER] Email already registered: {}", email);
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Email already registered".to_string(),
                }),
            ));
        }
        Ok(None) => {}
        Err(e) => {
            error!("[REGISTER] Database error checking email: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            ));
        }
    }

    debug!("[REGISTER] Hashing password...");
    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("[REGISTER] Password rejected: {}", e);
            return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })));
        }
    };

    debug!("[REGISTER] Creating account...");
    let user = match UserRepository::create(&pool, &email, &password_hash).await {
        Ok(user) => user,
        Err(e) => {
            error!("[REGISTER] Failed to create account: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create account".to_string(),
                }),
            ));
        }
    };

    let token = match encode_jwt(
        user.id,
        user.email.clone(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("[REGISTER] JWT encoding failed: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate token".to_string(),
                }),
            ));
        }
    };

    info!("[REGISTER] ACCOUNT_CREATED id={} email={}", user.id, user.email);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserInfo::from(&user),
            token,
            message: "Registration successful".to_string(),
        }),
    ))
}

/// Login handler - authenticates an existing account.
///
/// # Returns
///
/// * `Ok((StatusCode::OK, AuthResponse))` - Authentication successful with token
/// * `Err((StatusCode, ErrorResponse))` - Invalid credentials or server error
pub async fn login(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("[LOGIN] LOGIN ATTEMPT");

    let email = req.email.trim().to_lowercase();

    let user = match UserRepository::find_by_email(&pool, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("[LOGIN] Unknown email: {}", email);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid credentials".to_string(),
                }),
            ));
        }
        Err(e) => {
            error!("[LOGIN] Database error: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            ));
        }
    };

    debug!("[LOGIN] Verifying password...");
    let is_valid = match verify_password(&req.password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            error!("[LOGIN] Password verification error: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Authentication error".to_string(),
                }),
            ));
        }
    };

    if !is_valid {
        warn!("[LOGIN] Invalid password for account {}", user.id);
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid credentials".to_string(),
            }),
        ));
    }

    let _ = UserRepository::update_last_login(&pool, user.id).await;

    let token = match encode_jwt(
        user.id,
        user.email.clone(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("[LOGIN] JWT encoding failed: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate token".to_string(),
                }),
            ));
        }
    };

    info!("[LOGIN] AUTHENTICATED id={} email={}", user.id, user.email);

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            user: UserInfo::from(&user),
            token,
            message: "Login successful".to_string(),
        }),
    ))
}

/// Profile handler - the authenticated account's own record.
pub async fn profile(
    State(pool): State<DbPool>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ProfileResponse>, (StatusCode, Json<ErrorResponse>)> {
    match UserRepository::find_by_id(&pool, identity.id).await {
        Ok(Some(user)) => Ok(Json(ProfileResponse {
            user: UserInfo::from(&user),
        })),
        Ok(None) => {
            warn!("[PROFILE] Account {} no longer exists", identity.id);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "User not found".to_string(),
                }),
            ))
        }
        Err(e) => {
            error!("[PROFILE] Database error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            ))
        }
    }
}

/// Logout handler - revokes the presented token.
///
/// The revocation entry carries the token's own expiry so the background
/// sweep can drop it once validation would refuse the token anyway.
pub async fn logout(
    State(config): State<Config>,
    State(revoked): State<Arc<RevokedTokens>>,
    Extension(identity): Extension<Identity>,
    Extension(token): Extension<BearerToken>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    // The middleware already validated this token; decoding again only
    // recovers its expiry timestamp.
    let expires_at = match decode_jwt(&token.0, &config.jwt_secret) {
        Ok(claims) => claims.exp,
        Err(e) => {
            error!("[LOGOUT] Could not read token expiry: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to revoke token".to_string(),
                }),
            ));
        }
    };

    revoked.revoke(&token.0, expires_at);
    info!(
        "[LOGOUT] TOKEN_REVOKED id={} revoked_total={}",
        identity.id,
        revoked.len()
    );

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests;
