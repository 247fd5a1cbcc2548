//! # Authentication Middleware
//!
//! Axum middleware guarding the REST API. Extracts the bearer token from the
//! `Authorization` header, runs the full credential check (present, not
//! revoked, signature valid), and injects the authenticated [`Identity`]
//! into request extensions.
//!
//! Handlers that need the raw token (logout revokes it) can additionally
//! extract [`BearerToken`].
//!
//! Every refusal answers `401` with the same `Authentication error` body;
//! the precise reason only reaches the log.
//!
//! [`Identity`]: lib_auth::Identity

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use lib_auth::{verify_credential, RevokedTokens};
use lib_core::dto::ErrorResponse;
use lib_core::Config;
use tracing::{debug, warn};

/// The raw bearer token exactly as the client presented it.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Authentication middleware for protected routes.
///
/// On success the request gains an [`lib_auth::Identity`] and a
/// [`BearerToken`] extension; on failure the request is answered here and
/// never reaches the handler.
pub async fn require_auth(
    State(config): State<Config>,
    State(revoked): State<Arc<RevokedTokens>>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let bearer: Option<String> = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    match verify_credential(bearer.as_deref(), &config.jwt_secret, &revoked) {
        Ok(identity) => {
            debug!("[AUTH] AUTHENTICATED id={} email={}", identity.id, identity.email);

            if let Some(token) = bearer {
                req.extensions_mut().insert(BearerToken(token));
            }
            req.extensions_mut().insert(identity);

            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!("[AUTH] REFUSED path={} reason={}", req.uri().path(), e);
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Authentication error".to_string(),
                }),
            ))
        }
    }
}
