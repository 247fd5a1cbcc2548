//! # Authentication Library
//!
//! Password hashing, JWT token management, and credential verification
//! for the workspace server.

pub mod pwd;
pub mod revocation;
pub mod token;

// Re-export commonly used types
pub use pwd::{hash_password, verify_password};
pub use revocation::RevokedTokens;
pub use token::{AuthError, Claims, Identity, decode_jwt, encode_jwt, verify_credential};
