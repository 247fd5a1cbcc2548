//! # Database Store
//!
//! Database connection pool and repository implementations.

// region: --- Modules
pub mod message_repository;
pub mod models;
pub mod project_repository;
pub mod user_repository;
// endregion: --- Modules

// region: --- Re-exports
pub use message_repository::MessageRepository;
pub use project_repository::ProjectRepository;
pub use user_repository::UserRepository;
// endregion: --- Re-exports

// region: --- Types and Functions
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};

/// Type alias for SQLite connection pool.
pub type DbPool = SqlitePool;

/// Create a new SQLite connection pool for the given database URL.
pub async fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let options = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;

    Ok(pool)
}
// endregion: --- Types and Functions
