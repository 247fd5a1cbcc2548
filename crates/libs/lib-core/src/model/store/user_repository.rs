//! # User Repository
//!
//! Provides database access layer for user-related operations.
//!
//! This module implements the repository pattern for user data access,
//! providing a clean abstraction over SQL queries.

use super::models::{User, UserForCreate};
use super::DbPool;
use sqlx::query_as;

/// User repository for database operations.
///
/// Provides methods for creating, retrieving, and updating user records.
/// All methods are async and return `Result` types for proper error handling.
pub struct UserRepository;

impl UserRepository {
    /// Find a user by their email address.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - User found with matching email
    /// * `Ok(None)` - No user found with that email
    /// * `Err(sqlx::Error)` - Database error occurred
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by their id.
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new user using `UserForCreate`.
    ///
    /// This is the preferred method for creating users as it uses the type-safe
    /// `UserForCreate` struct.
    pub async fn create_with(pool: &DbPool, user_data: UserForCreate) -> Result<User, sqlx::Error> {
        Self::create(pool, &user_data.email, &user_data.password_hash).await
    }

    /// Create a new user in the database.
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `email` - The email address for the new user (must be unique)
    /// * `password_hash` - The hashed password (use `lib_auth::hash_password`)
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if:
    /// - Email already exists (UNIQUE constraint violation)
    /// - Database connection fails
    pub async fn create(
        pool: &DbPool,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let result = sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, ?)")
            .bind(email)
            .bind(password_hash)
            .execute(pool)
            .await?;

        let id = result.last_insert_rowid();

        query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Update the last login timestamp for a user.
    ///
    /// # Note
    ///
    /// This method does not verify that the user exists. If the user ID is invalid,
    /// it will succeed but not update any rows.
    pub async fn update_last_login(pool: &DbPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// List every user except the given one, newest accounts first.
    ///
    /// Backs the collaborator picker, which never shows the caller themselves.
    pub async fn list_all_except(pool: &DbPool, user_id: i64) -> Result<Vec<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE id != ? ORDER BY created_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Create an in-memory SQLite database for testing
    async fn setup_test_db() -> DbPool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                last_login TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .expect("Failed to create users table");

        pool
    }

    // ========== User Creation Tests ==========

    #[tokio::test]
    async fn test_create_user() {
        let pool = setup_test_db().await;

        let user = UserRepository::create(&pool, "test@example.com", "argon2-hash")
            .await
            .unwrap();

        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.password_hash, "argon2-hash");
        assert!(user.last_login.is_none());
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let pool = setup_test_db().await;

        UserRepository::create(&pool, "test@example.com", "hash-one")
            .await
            .unwrap();

        let result = UserRepository::create(&pool, "test@example.com", "hash-two").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_with_user_for_create() {
        let pool = setup_test_db().await;

        let user = UserRepository::create_with(
            &pool,
            UserForCreate::new("alice@example.com".to_string(), "hash".to_string()),
        )
        .await
        .unwrap();

        assert_eq!(user.email, "alice@example.com");
    }

    // ========== User Retrieval Tests ==========

    #[tokio::test]
    async fn test_find_by_email() {
        let pool = setup_test_db().await;

        UserRepository::create(&pool, "test@example.com", "hash")
            .await
            .unwrap();

        let found = UserRepository::find_by_email(&pool, "test@example.com")
            .await
            .unwrap();

        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_find_by_email_not_found() {
        let pool = setup_test_db().await;

        let found = UserRepository::find_by_email(&pool, "nonexistent@example.com")
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let pool = setup_test_db().await;

        let created = UserRepository::create(&pool, "test@example.com", "hash")
            .await
            .unwrap();

        let found = UserRepository::find_by_id(&pool, created.id).await.unwrap();

        assert_eq!(
            found.expect("User should exist after creation").email,
            "test@example.com"
        );
    }

    // ========== Last Login Tests ==========

    #[tokio::test]
    async fn test_update_last_login() {
        let pool = setup_test_db().await;

        let user = UserRepository::create(&pool, "test@example.com", "hash")
            .await
            .unwrap();
        assert!(user.last_login.is_none());

        UserRepository::update_last_login(&pool, user.id)
            .await
            .unwrap();

        let updated = UserRepository::find_by_id(&pool, user.id)
            .await
            .unwrap()
            .unwrap();

        assert!(updated.last_login.is_some());
    }

    #[tokio::test]
    async fn test_update_last_login_nonexistent_user() {
        let pool = setup_test_db().await;

        // Should not error even if user doesn't exist
        let result = UserRepository::update_last_login(&pool, 99999).await;
        assert!(result.is_ok());
    }

    // ========== Listing Tests ==========

    #[tokio::test]
    async fn test_list_all_except_excludes_caller() {
        let pool = setup_test_db().await;

        let alice = UserRepository::create(&pool, "alice@example.com", "hash")
            .await
            .unwrap();
        UserRepository::create(&pool, "bob@example.com", "hash")
            .await
            .unwrap();
        UserRepository::create(&pool, "carol@example.com", "hash")
            .await
            .unwrap();

        let others = UserRepository::list_all_except(&pool, alice.id).await.unwrap();

        assert_eq!(others.len(), 2);
        assert!(others.iter().all(|u| u.id != alice.id));
    }

    #[tokio::test]
    async fn test_list_all_except_empty_db() {
        let pool = setup_test_db().await;

        let others = UserRepository::list_all_except(&pool, 1).await.unwrap();

        assert!(others.is_empty());
    }
}
