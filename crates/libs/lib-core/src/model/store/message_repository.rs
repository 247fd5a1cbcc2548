//! # Message Repository
//!
//! Append-only store for project chat messages. Read order is the canonical
//! room order: insertion order, oldest first.

use super::models::StoredMessage;
use super::DbPool;
use sqlx::query_as;

/// Message repository for database operations.
pub struct MessageRepository;

impl MessageRepository {
    /// Append a message to a project's history.
    ///
    /// `sender_id` is free text so AI replies can use the `"ai"` sentinel
    /// alongside stringified account ids.
    pub async fn append(
        pool: &DbPool,
        project_id: i64,
        sender_id: &str,
        sender_email: &str,
        body: &str,
    ) -> Result<StoredMessage, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO messages (project_id, sender_id, sender_email, body) VALUES (?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(sender_id)
        .bind(sender_email)
        .bind(body)
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();

        query_as::<_, StoredMessage>("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// All messages of a project in insertion order, oldest first.
    ///
    /// The id tie-break keeps same-timestamp rows in insertion order.
    pub async fn list_for_project(
        pool: &DbPool,
        project_id: i64,
    ) -> Result<Vec<StoredMessage>, sqlx::Error> {
        query_as::<_, StoredMessage>(
            "SELECT * FROM messages WHERE project_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Delete all messages of a project. Returns how many rows were removed;
    /// purging an already-empty project is a no-op returning 0.
    pub async fn purge_project(pool: &DbPool, project_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM messages WHERE project_id = ?")
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete every message in the store. Maintenance use only.
    pub async fn delete_all(pool: &DbPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM messages").execute(pool).await?;
        Ok(result.rows_affected())
    }
}
