//! # User Directory Handler
//!
//! HTTP endpoint for listing collaborator candidates.
//!
//! ## Endpoints
//!
//! - `GET /api/users` - List all users except the caller

use axum::{extract::State, Extension, Json};
use lib_auth::Identity;
use lib_core::dto::{UserInfo, UsersResponse};
use lib_core::error::Result;
use lib_core::model::store::UserRepository;
use lib_core::DbPool;
use tracing::debug;

/// List every registered user except the caller.
///
/// **Route**: `GET /api/users`
///
/// Backs the member picker: the caller never appears in their own list.
pub async fn list_users(
    State(pool): State<DbPool>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UsersResponse>> {
    let users = UserRepository::list_all_except(&pool, identity.id).await?;

    debug!("[USERS] LISTED caller={} count={}", identity.id, users.len());

    Ok(Json(UsersResponse {
        users: users.iter().map(UserInfo::from).collect(),
    }))
}
