//! # Model Layer
//!
//! Database-backed models and repositories.

pub mod store;
