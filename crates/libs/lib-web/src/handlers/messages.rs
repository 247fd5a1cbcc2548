//! # Message History Handlers
//!
//! REST access to a project's chat history. The WebSocket path appends to
//! this history; these endpoints read and clear it.
//!
//! ## Endpoints
//!
//! - `GET /api/projects/{id}/messages` - Full history, oldest first
//! - `DELETE /api/projects/{id}/messages` - Clear the history
//!
//! History reads answer an empty list for projects with no messages, unknown
//! ids included. Purging is idempotent; a second purge deletes zero rows and
//! still succeeds.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use lib_auth::Identity;
use lib_core::dto::{MessageRecord, MessagesResponse, PurgeResponse};
use lib_core::error::Result;
use lib_core::model::store::MessageRepository;
use lib_core::DbPool;
use tracing::{debug, info};

use super::projects::parse_project_id;

/// Read a project's full message history in room order.
///
/// **Route**: `GET /api/projects/{id}/messages`
pub async fn project_messages(
    State(pool): State<DbPool>,
    Path(project_id): Path<String>,
) -> Result<Json<MessagesResponse>> {
    let id = parse_project_id(&project_id)?;

    let stored = MessageRepository::list_for_project(&pool, id).await?;

    debug!("[MESSAGES] HISTORY project={} count={}", id, stored.len());

    Ok(Json(MessagesResponse {
        messages: stored.iter().map(MessageRecord::from).collect(),
    }))
}

/// Delete a project's entire message history.
///
/// **Route**: `DELETE /api/projects/{id}/messages`
pub async fn purge_messages(
    State(pool): State<DbPool>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<String>,
) -> Result<Json<PurgeResponse>> {
    let id = parse_project_id(&project_id)?;

    let deleted = MessageRepository::purge_project(&pool, id).await?;

    info!(
        "[MESSAGES] PURGED project={} deleted={} by={}",
        id, deleted, identity.id
    );

    Ok(Json(PurgeResponse {
        message: "All messages cleared successfully".to_string(),
        deleted,
    }))
}
