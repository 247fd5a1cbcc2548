//! # Request/Response Logging Middleware
//!
//! Structured logging for HTTP requests and responses with request IDs and
//! per-status-class log levels.
//!
//! This middleware logs:
//! - Request method, path, query params (redacted on sensitive endpoints)
//! - Request headers (sanitized)
//! - Response status, size, duration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use axum::{middleware, Router};
//! use lib_web::middleware::mw_logging::log_requests;
//!
//! let app: Router = Router::new().layer(middleware::from_fn(log_requests));
//! ```

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Sensitive headers that should not be logged
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "x-api-key",
    "x-auth-token",
    "authentication",
];

/// Endpoints whose query strings may carry credentials or raw passwords.
///
/// The WebSocket handshake accepts `?token=<jwt>`, so its query must never
/// reach the logs.
const SENSITIVE_ENDPOINTS: &[&str] = &["/api/auth/login", "/api/auth/register", "/api/ws/"];

/// Request/response logging middleware.
///
/// Logs every HTTP request and response including method, path, sanitized
/// headers, response status, and duration. Query strings on sensitive
/// endpoints are redacted.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path().to_string();

    let is_sensitive = SENSITIVE_ENDPOINTS.iter().any(|ep| path.starts_with(ep));

    let query = uri.query().map(|q| {
        if is_sensitive {
            "***REDACTED***".to_string()
        } else {
            q.to_string()
        }
    });

    // Request ID from extensions if the stamping middleware ran first
    let request_id = req
        .extensions()
        .get::<crate::middleware::mw_req_stamp::RequestStamp>()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    // Log headers (sanitized)
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            if SENSITIVE_HEADERS.iter().any(|h| name_lower.contains(h)) {
                Some((name.to_string(), "***REDACTED***".to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect();

    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let client_ip = req
        .headers()
        .get("x-forwarded-for")
        .or_else(|| req.headers().get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        query = ?query,
        user_agent = ?user_agent,
        client_ip = ?client_ip,
        header_count = headers.len(),
        "[REQUEST] {} {} {}",
        method,
        path,
        query.as_ref().map(|q| format!("?{}", q)).unwrap_or_default()
    );

    debug!(
        request_id = %request_id,
        headers = ?headers,
        "[REQUEST HEADERS]"
    );

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();
    let status_code = status.as_u16();

    // Approximate response size from headers
    let content_length = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(0);

    if status.is_success() {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status_code,
            duration_ms = duration.as_millis(),
            duration_secs = duration.as_secs_f64(),
            size_bytes = content_length,
            "[RESPONSE] {} {} -> {} ({}ms, {} bytes)",
            method,
            path,
            status_code,
            duration.as_millis(),
            content_length
        );
    } else if status.is_client_error() {
        warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status_code,
            duration_ms = duration.as_millis(),
            "[RESPONSE] {} {} -> {} ({}ms) [CLIENT ERROR]",
            method,
            path,
            status_code,
            duration.as_millis()
        );
    } else if status.is_server_error() {
        error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status_code,
            duration_ms = duration.as_millis(),
            is_websocket = path.contains("/ws/"),
            "[RESPONSE] {} {} -> {} ({}ms) [SERVER ERROR]",
            method,
            path,
            status_code,
            duration.as_millis()
        );

        // Extra logging for WebSocket handshake failures
        if path.contains("/ws/") {
            error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = status_code,
                "[WS] WEBSOCKET_ERROR request_id={} method={} path={} status={} - WebSocket connection failed",
                request_id,
                method,
                path,
                status_code
            );
        }
    }

    response
}
