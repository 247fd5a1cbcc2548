//! # HTTP Request Handlers
//!
//! This module contains all Axum HTTP request handlers organized by feature domain.
//!
//! Each handler module follows the **single responsibility principle**, handling
//! all HTTP endpoints for a specific feature area. Handlers delegate persistence
//! to the repositories in [`lib_core::model::store`] and collaboration plumbing
//! to [`crate::collab`].
//!
//! ## Handler Modules
//!
//! - **[`auth`]**: Account endpoints
//!   - `POST /api/auth/register` - Create new account
//!   - `POST /api/auth/login` - Authenticate with email/password
//!   - `GET /api/auth/profile` - Authenticated account profile
//!   - `GET /api/auth/logout` - Revoke the presented token
//!
//! - **[`users`]**: User directory endpoints
//!   - `GET /api/users` - List all users except the caller
//!
//! - **[`projects`]**: Project directory endpoints
//!   - `POST /api/projects` - Create a project
//!   - `GET /api/projects` - List the caller's projects
//!   - `GET /api/projects/{id}` - One project with members and file tree
//!   - `PUT /api/projects/{id}/members` - Add members
//!   - `PUT /api/projects/{id}/file-tree` - Replace the file tree
//!
//! - **[`messages`]**: Message history endpoints
//!   - `GET /api/projects/{id}/messages` - Full history, oldest first
//!   - `DELETE /api/projects/{id}/messages` - Clear the history
//!
//! - **[`ai`]**: Direct AI assistant endpoint
//!   - `GET /api/ai?prompt=...` - One-shot inference
//!
//! - **[`websocket`]**: Project room WebSocket
//!   - `GET /api/ws/projects/{project_id}` - Join a project room
//!
//! ## Handler Architecture
//!
//! All handlers follow Axum's extractor pattern:
//!
//! ```rust,ignore
//! async fn handler(
//!     State(pool): State<DbPool>,                // Shared state
//!     Extension(identity): Extension<Identity>,  // Verified caller
//!     Json(payload): Json<RequestBody>,          // Request body
//! ) -> Result<Json<Response>> {
//!     // Handler logic...
//!     Ok(Json(response))
//! }
//! ```
//!
//! ## Authentication
//!
//! Protected endpoints use `Extension<Identity>` to read the verified caller.
//! The auth middleware runs the full credential check (present, not revoked,
//! signature valid) before handlers execute.
//!
//! Public endpoints (register, login, health check, the WebSocket upgrade
//! path which checks credentials itself) don't go through the middleware.
//!
//! ## Error Handling
//!
//! Account handlers answer errors as explicit `(StatusCode, Json<ErrorResponse>)`
//! tuples; the rest return [`lib_core::AppError`], which renders as
//! `{"error": ..., "code": ...}` through its `IntoResponse` impl.

pub mod ai;
pub mod auth;
pub mod messages;
pub mod projects;
pub mod users;
pub mod websocket;

// Note: Individual handler functions are not re-exported here to avoid
// ambiguous glob re-exports. Import specific handlers from their modules:
// use lib_web::handlers::auth::{register, login};
// use lib_web::handlers::projects::create_project;
// etc.
