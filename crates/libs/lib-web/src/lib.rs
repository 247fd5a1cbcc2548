//! # Web Library
//!
//! HTTP handlers, middleware, WebSocket collaboration, and server setup.

pub mod collab;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{start_server, AppState, ServerConfig};
