//! # Data Transfer Objects (DTOs)
//!
//! This module contains all data structures used for communication between
//! clients and the server, over REST and over the project WebSocket.

pub mod auth;
pub mod messaging;
pub mod project;

pub use auth::*;
pub use messaging::*;
pub use project::*;
