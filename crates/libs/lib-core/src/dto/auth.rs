//! # Authentication Data Transfer Objects
//!
//! Defines request and response structures for account endpoints.
//!
//! ## Endpoints Using These DTOs
//!
//! - `POST /api/auth/register` - [`RegisterRequest`] -> [`AuthResponse`]
//! - `POST /api/auth/login` - [`LoginRequest`] -> [`AuthResponse`]
//! - `GET /api/auth/profile` - [`ProfileResponse`]
//! - `GET /api/auth/logout` - [`MessageResponse`]
//! - `GET /api/users` - [`UsersResponse`]
//!
//! ## Wire Format
//!
//! All DTOs use **snake_case** field names in JSON (default serde behavior).
//! Optional fields are omitted when `None` using
//! `#[serde(skip_serializing_if = "Option::is_none")]`.
//!
//! ```text
//! POST /api/auth/login
//! Content-Type: application/json
//!
//! { "email": "alice@example.com", "password": "MyPassword123!" }
//! ```
//!
//! Response:
//! ```text
//! {
//!   "user": { "id": "1", "email": "alice@example.com", "created_at": "2024-01-01T00:00:00Z" },
//!   "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
//!   "message": "Login successful"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::model::store::models::User;
use lib_utils::time::format_time;

/// Registration request for a new account.
///
/// Email must be unique; it is trimmed and lowercased server-side before
/// storage. Password is plaintext over HTTPS and hashed with Argon2 on
/// arrival, minimum 8 characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Login request with account email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authentication response returned on successful login or registration.
///
/// The `token` field goes into subsequent requests as
/// `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub user: UserInfo,
    pub token: String,
    pub message: String,
}

/// User information (public, safe to send to client).
///
/// Never includes password hashes. The id is the database primary key as a
/// string, matching the id used in message sender payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            created_at: format_time(user.created_at),
            last_login: user.last_login.map(format_time),
        }
    }
}

/// Profile response for the authenticated account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileResponse {
    pub user: UserInfo,
}

/// All registered users except the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsersResponse {
    pub users: Vec<UserInfo>,
}

/// Generic success envelope for endpoints that only confirm an action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

/// Standard error response for all API endpoints.
///
/// # JSON Example
///
/// ```json
/// { "error": "Invalid credentials" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
