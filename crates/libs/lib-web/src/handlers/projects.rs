//! # Project Directory Handlers
//!
//! HTTP endpoints for creating projects, inviting members, and replacing the
//! shared file tree.
//!
//! ## Endpoints
//!
//! - `POST /api/projects` - Create a project (creator becomes first member)
//! - `GET /api/projects` - List the caller's projects
//! - `GET /api/projects/{id}` - Fetch one project with members and file tree
//! - `PUT /api/projects/{id}/members` - Add members (idempotent per member)
//! - `PUT /api/projects/{id}/file-tree` - Replace the file tree wholesale
//!
//! All endpoints sit behind the bearer-auth middleware; the caller arrives
//! as an [`Identity`] extension. Project names are trimmed and lowercased
//! before storage and must be unique across the directory.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use lib_auth::Identity;
use lib_core::dto::{
    AddMembersRequest, CreateProjectRequest, FileTree, ProjectDetail, ProjectResponse,
    ProjectSummary, ProjectsResponse, UpdateFileTreeRequest, UserInfo,
};
use lib_core::error::{AppError, Result};
use lib_core::model::store::models::Project;
use lib_core::model::store::{ProjectRepository, UserRepository};
use lib_core::DbPool;
use lib_utils::time::format_time;
use lib_utils::validation::validate_not_empty;
use tracing::{debug, info, instrument};

/// Parse a path project id, refusing anything that is not an integer.
pub(crate) fn parse_project_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidInput("Invalid projectId".to_string()))
}

/// Load a project and refuse callers that are not members of it.
async fn member_project(pool: &DbPool, project_id: i64, caller: i64) -> Result<Project> {
    let project = ProjectRepository::find_by_id(pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !ProjectRepository::is_member(pool, project_id, caller).await? {
        return Err(AppError::Forbidden("Not a project member".to_string()));
    }

    Ok(project)
}

/// Resolve a project row into the full client view: members as `UserInfo`
/// and the file tree deserialized from its stored form.
async fn project_detail(pool: &DbPool, project: &Project) -> Result<ProjectDetail> {
    let member_ids = ProjectRepository::member_ids(pool, project.id).await?;

    let mut members = Vec::with_capacity(member_ids.len());
    for id in member_ids {
        if let Some(user) = UserRepository::find_by_id(pool, id).await? {
            members.push(UserInfo::from(&user));
        }
    }

    let file_tree: FileTree = serde_json::from_str(&project.file_tree)?;

    Ok(ProjectDetail {
        id: project.id.to_string(),
        name: project.name.clone(),
        members,
        file_tree,
        created_at: format_time(project.created_at),
    })
}

/// Create a new project with the caller as its first member.
///
/// **Route**: `POST /api/projects`
#[instrument(skip(pool, req), fields(caller = %identity.id))]
pub async fn create_project(
    State(pool): State<DbPool>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>)> {
    let name = req.name.trim().to_lowercase();

    validate_not_empty(&name, "Project name").map_err(AppError::InvalidInput)?;

    if ProjectRepository::find_by_name(&pool, &name).await?.is_some() {
        return Err(AppError::InvalidInput(
            "Project name already taken".to_string(),
        ));
    }

    let project = ProjectRepository::create(&pool, &name, identity.id).await?;

    info!(
        "[PROJECT] CREATED id={} name={} creator={}",
        project.id, project.name, identity.id
    );

    let detail = project_detail(&pool, &project).await?;
    Ok((StatusCode::CREATED, Json(ProjectResponse { project: detail })))
}

/// List every project the caller is a member of, newest first.
///
/// **Route**: `GET /api/projects`
pub async fn list_projects(
    State(pool): State<DbPool>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ProjectsResponse>> {
    let projects = ProjectRepository::list_for_user(&pool, identity.id).await?;

    let mut summaries = Vec::with_capacity(projects.len());
    for project in &projects {
        let member_ids = ProjectRepository::member_ids(&pool, project.id).await?;
        summaries.push(ProjectSummary::from_project(project, &member_ids));
    }

    debug!(
        "[PROJECT] LISTED caller={} count={}",
        identity.id,
        summaries.len()
    );

    Ok(Json(ProjectsResponse {
        projects: summaries,
    }))
}

/// Fetch one project with its members resolved and the file tree included.
///
/// **Route**: `GET /api/projects/{id}`
///
/// Only members can read a project.
pub async fn get_project(
    State(pool): State<DbPool>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>> {
    let id = parse_project_id(&project_id)?;
    let project = member_project(&pool, id, identity.id).await?;

    let detail = project_detail(&pool, &project).await?;
    Ok(Json(ProjectResponse { project: detail }))
}

/// Add members to a project. Ids already present are skipped, so repeating
/// the call changes nothing.
///
/// **Route**: `PUT /api/projects/{id}/members`
#[instrument(skip(pool, req), fields(caller = %identity.id))]
pub async fn add_members(
    State(pool): State<DbPool>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<String>,
    Json(req): Json<AddMembersRequest>,
) -> Result<Json<ProjectResponse>> {
    let id = parse_project_id(&project_id)?;
    let project = member_project(&pool, id, identity.id).await?;

    let mut user_ids = Vec::with_capacity(req.users.len());
    for raw in &req.users {
        let user_id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::InvalidInput(format!("Invalid user id: {raw}")))?;

        if UserRepository::find_by_id(&pool, user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User not found: {user_id}")));
        }

        user_ids.push(user_id);
    }

    let added = ProjectRepository::add_members(&pool, id, &user_ids).await?;

    info!(
        "[PROJECT] MEMBERS_ADDED project={} requested={} added={}",
        id,
        user_ids.len(),
        added
    );

    let detail = project_detail(&pool, &project).await?;
    Ok(Json(ProjectResponse { project: detail }))
}

/// Replace a project's file tree wholesale with the submitted mapping.
///
/// **Route**: `PUT /api/projects/{id}/file-tree`
///
/// The server stores the tree as an opaque document; previous entries are
/// gone after the swap.
pub async fn update_file_tree(
    State(pool): State<DbPool>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<String>,
    Json(req): Json<UpdateFileTreeRequest>,
) -> Result<Json<ProjectResponse>> {
    let id = parse_project_id(&project_id)?;
    member_project(&pool, id, identity.id).await?;

    let serialized = serde_json::to_string(&req.file_tree)?;
    ProjectRepository::update_file_tree(&pool, id, &serialized).await?;

    debug!(
        "[PROJECT] FILE_TREE_REPLACED project={} files={}",
        id,
        req.file_tree.len()
    );

    let project = ProjectRepository::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let detail = project_detail(&pool, &project).await?;
    Ok(Json(ProjectResponse { project: detail }))
}
