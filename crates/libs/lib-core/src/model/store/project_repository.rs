//! # Project Repository
//!
//! Database access layer for projects and their membership rows.

use super::models::Project;
use super::DbPool;
use sqlx::{query_as, query_scalar};

/// Project repository for database operations.
///
/// A project always has at least one member: its creator, inserted in the
/// same transaction that creates the project row.
pub struct ProjectRepository;

impl ProjectRepository {
    /// Create a new project with the creator as its first member.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the name already exists (UNIQUE constraint)
    /// or the database fails.
    pub async fn create(pool: &DbPool, name: &str, creator_id: i64) -> Result<Project, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO projects (name, creator_id, file_tree) VALUES (?, ?, '{}')",
        )
        .bind(name)
        .bind(creator_id)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();

        sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES (?, ?)")
            .bind(id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its id.
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<Project>, sqlx::Error> {
        query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project by its (normalized) name.
    pub async fn find_by_name(pool: &DbPool, name: &str) -> Result<Option<Project>, sqlx::Error> {
        query_as::<_, Project>("SELECT * FROM projects WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List every project the user is a member of, newest first.
    pub async fn list_for_user(pool: &DbPool, user_id: i64) -> Result<Vec<Project>, sqlx::Error> {
        query_as::<_, Project>(
            r#"
            SELECT p.* FROM projects p
            JOIN project_members pm ON pm.project_id = p.id
            WHERE pm.user_id = ?
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Member ids of a project, ascending.
    pub async fn member_ids(pool: &DbPool, project_id: i64) -> Result<Vec<i64>, sqlx::Error> {
        query_scalar::<_, i64>(
            "SELECT user_id FROM project_members WHERE project_id = ? ORDER BY user_id",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Whether the user is a member of the project.
    pub async fn is_member(pool: &DbPool, project_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM project_members WHERE project_id = ? AND user_id = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count > 0)
    }

    /// Add members to a project. Already-present members are skipped, so the
    /// call is idempotent per user. Returns how many rows were actually added.
    pub async fn add_members(
        pool: &DbPool,
        project_id: i64,
        user_ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        let mut added = 0;

        for user_id in user_ids {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO project_members (project_id, user_id) VALUES (?, ?)",
            )
            .bind(project_id)
            .bind(user_id)
            .execute(pool)
            .await?;

            added += result.rows_affected();
        }

        Ok(added)
    }

    /// Replace the project's file tree wholesale with the given serialized
    /// mapping. Returns how many rows were updated (0 when the project does
    /// not exist).
    pub async fn update_file_tree(
        pool: &DbPool,
        project_id: i64,
        file_tree: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET file_tree = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(file_tree)
        .bind(project_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> DbPool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                creator_id INTEGER NOT NULL,
                file_tree TEXT NOT NULL DEFAULT '{}',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .expect("Failed to create projects table");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS project_members (
                project_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                PRIMARY KEY (project_id, user_id)
            )
            "#,
        )
        .execute(&pool)
        .await
        .expect("Failed to create project_members table");

        pool
    }

    // ========== Creation Tests ==========

    #[tokio::test]
    async fn test_create_project_adds_creator_as_member() {
        let pool = setup_test_db().await;

        let project = ProjectRepository::create(&pool, "alpha", 1).await.unwrap();

        assert_eq!(project.name, "alpha");
        assert_eq!(project.creator_id, 1);
        assert_eq!(project.file_tree, "{}");

        let members = ProjectRepository::member_ids(&pool, project.id).await.unwrap();
        assert_eq!(members, vec![1]);
    }

    #[tokio::test]
    async fn test_create_project_duplicate_name() {
        let pool = setup_test_db().await;

        ProjectRepository::create(&pool, "alpha", 1).await.unwrap();
        let result = ProjectRepository::create(&pool, "alpha", 2).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let pool = setup_test_db().await;
        let created = ProjectRepository::create(&pool, "alpha", 1).await.unwrap();

        let found = ProjectRepository::find_by_name(&pool, "alpha").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(created.id));

        let missing = ProjectRepository::find_by_name(&pool, "beta").await.unwrap();
        assert!(missing.is_none());
    }

    // ========== Membership Tests ==========

    #[tokio::test]
    async fn test_add_members_is_idempotent() {
        let pool = setup_test_db().await;
        let project = ProjectRepository::create(&pool, "alpha", 1).await.unwrap();

        let added = ProjectRepository::add_members(&pool, project.id, &[2, 3]).await.unwrap();
        assert_eq!(added, 2);

        // Re-adding the same users changes nothing
        let added_again = ProjectRepository::add_members(&pool, project.id, &[2, 3]).await.unwrap();
        assert_eq!(added_again, 0);

        let members = ProjectRepository::member_ids(&pool, project.id).await.unwrap();
        assert_eq!(members, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_is_member() {
        let pool = setup_test_db().await;
        let project = ProjectRepository::create(&pool, "alpha", 1).await.unwrap();

        assert!(ProjectRepository::is_member(&pool, project.id, 1).await.unwrap());
        assert!(!ProjectRepository::is_member(&pool, project.id, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_for_user() {
        let pool = setup_test_db().await;

        let alpha = ProjectRepository::create(&pool, "alpha", 1).await.unwrap();
        ProjectRepository::create(&pool, "beta", 2).await.unwrap();
        let gamma = ProjectRepository::create(&pool, "gamma", 1).await.unwrap();

        let mine = ProjectRepository::list_for_user(&pool, 1).await.unwrap();

        let ids: Vec<i64> = mine.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&alpha.id));
        assert!(ids.contains(&gamma.id));
    }

    // ========== File Tree Tests ==========

    #[tokio::test]
    async fn test_update_file_tree() {
        let pool = setup_test_db().await;
        let project = ProjectRepository::create(&pool, "alpha", 1).await.unwrap();

        let tree = r#"{"app.js":{"contents":"console.log(1)"}}"#;
        let updated = ProjectRepository::update_file_tree(&pool, project.id, tree).await.unwrap();
        assert_eq!(updated, 1);

        let fetched = ProjectRepository::find_by_id(&pool, project.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.file_tree, tree);
    }

    #[tokio::test]
    async fn test_update_file_tree_missing_project() {
        let pool = setup_test_db().await;

        let updated = ProjectRepository::update_file_tree(&pool, 99, "{}").await.unwrap();

        assert_eq!(updated, 0);
    }
}
