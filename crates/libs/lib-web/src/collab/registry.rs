//! # Room Registry
//!
//! Resolves the raw project id from a WebSocket URL into a live room. A
//! room is simply a project that exists in the database; this runs before
//! any credential check so a bad id is refused as a bad id, not as an
//! authentication failure.

use lib_core::model::store::ProjectRepository;
use lib_core::DbPool;
use thiserror::Error;

/// Why a raw room id could not be resolved.
#[derive(Debug, Error)]
pub enum RoomError {
    /// The id is not a well-formed project id.
    #[error("Invalid projectId")]
    Malformed,

    /// The id is well-formed but no such project exists.
    #[error("Project not found")]
    NotFound,

    /// The lookup itself failed.
    #[error("project lookup failed: {0}")]
    Lookup(String),
}

/// A resolved room, ready for a session to join.
#[derive(Debug, Clone)]
pub struct RoomMeta {
    pub id: i64,
    pub name: String,
    /// Account ids of the project's members at resolution time.
    pub member_ids: Vec<i64>,
}

/// Resolves raw room ids against the project table.
#[derive(Clone)]
pub struct RoomRegistry {
    db: DbPool,
}

impl RoomRegistry {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Resolve a raw id into a room, or say precisely why it cannot be one.
    pub async fn resolve(&self, raw_id: &str) -> Result<RoomMeta, RoomError> {
        let id: i64 = raw_id.trim().parse().map_err(|_| RoomError::Malformed)?;

        let project = ProjectRepository::find_by_id(&self.db, id)
            .await
            .map_err(|e| RoomError::Lookup(e.to_string()))?
            .ok_or(RoomError::NotFound)?;

        let member_ids = ProjectRepository::member_ids(&self.db, id)
            .await
            .map_err(|e| RoomError::Lookup(e.to_string()))?;

        Ok(RoomMeta {
            id: project.id,
            name: project.name,
            member_ids,
        })
    }
}
