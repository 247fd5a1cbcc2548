//! # Project Data Transfer Objects
//!
//! Request and response structures for the project directory endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::auth::UserInfo;
use crate::model::store::models::Project;
use lib_utils::time::format_time;

/// One file in the virtual workspace tree.
///
/// The tree is a flat path-to-node mapping, replaced wholesale on update.
/// The server stores and broadcasts it without interpreting the contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileNode {
    pub contents: String,
}

/// Flat mapping of file path to node. BTreeMap keeps serialization stable.
pub type FileTree = BTreeMap<String, FileNode>;

/// Request to create a project. Name is trimmed and lowercased server-side
/// and must be unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateProjectRequest {
    pub name: String,
}

/// Request to add members to a project. Ids are the string form used
/// everywhere on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddMembersRequest {
    pub users: Vec<String>,
}

/// Request to replace a project's file tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateFileTreeRequest {
    pub file_tree: FileTree,
}

/// Project listing entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub member_ids: Vec<String>,
    pub created_at: String,
}

impl ProjectSummary {
    pub fn from_project(project: &Project, member_ids: &[i64]) -> Self {
        Self {
            id: project.id.to_string(),
            name: project.name.clone(),
            member_ids: member_ids.iter().map(|id| id.to_string()).collect(),
            created_at: format_time(project.created_at),
        }
    }
}

/// Full project view with resolved members and the file tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectDetail {
    pub id: String,
    pub name: String,
    pub members: Vec<UserInfo>,
    pub file_tree: FileTree,
    pub created_at: String,
}

/// Response wrapping a single project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectResponse {
    pub project: ProjectDetail,
}

/// Response wrapping the caller's project list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectsResponse {
    pub projects: Vec<ProjectSummary>,
}
