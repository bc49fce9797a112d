/// Project endpoints (role-scoped)
///
/// The Role Gate per operation:
/// - admin: full CRUD
/// - employee: list/read everything, update status and completion only
/// - client: list/read own projects only, no writes
///
/// A client asking for another client's project gets 403, never the data.
///
/// # Endpoints
///
/// - `GET    /api/projects` - List (scope depends on role)
/// - `POST   /api/projects` - Create (admin)
/// - `GET    /api/projects/:id` - Get
/// - `PUT    /api/projects/:id` - Update
/// - `DELETE /api/projects/:id` - Delete (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::request_meta::RequestMeta,
    routes::Pagination,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use opsportal_shared::{
    audit::AuditRecorder,
    auth::{
        authorization::{require_owner_or_admin, require_role, Role},
        middleware::AuthContext,
    },
    models::{
        audit_log::NewAuditLog,
        notification::{CreateNotification, Notification},
        project::{CreateProject, Project, ProjectStatus, UpdateProject},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Owning client
    pub client_id: Uuid,

    /// Assigned employee, if any
    pub assigned_to: Option<Uuid>,

    /// Project name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Optional description
    pub description: Option<String>,
}

/// Update project request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    /// Reassign to another employee (null to unassign)
    pub assigned_to: Option<Option<Uuid>>,

    /// New name
    pub name: Option<String>,

    /// New description (null to clear)
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<ProjectStatus>,

    /// New completion percentage (0-100)
    pub completion: Option<i32>,
}

impl UpdateProjectRequest {
    /// Whether the update touches fields employees may not change
    fn touches_admin_fields(&self) -> bool {
        self.assigned_to.is_some() || self.name.is_some() || self.description.is_some()
    }
}

/// List projects, scoped by role
///
/// Admins and employees see everything; clients see their own.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Vec<Project>>> {
    let (limit, offset) = pagination.resolve();

    let projects = match auth.role {
        Role::Admin | Role::Employee => Project::list(&state.db, limit, offset).await?,
        Role::Client => Project::list_for_client(&state.db, auth.user_id, limit, offset).await?,
    };

    Ok(Json(projects))
}

/// Create a project (admin only)
///
/// Notifies the assigned employee, if one is set.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    require_role(&auth, &[Role::Admin])?;
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            client_id: req.client_id,
            assigned_to: req.assigned_to,
            name: req.name,
            description: req.description,
        },
    )
    .await?;

    if let Some(assignee) = project.assigned_to {
        notify_assignment(&state, assignee, &project).await;
    }

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "create".to_string(),
            table_name: "projects".to_string(),
            record_id: Some(project.id),
            new_values: serde_json::to_value(&project).ok(),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(project))
}

/// Get a project
///
/// Clients only see their own projects.
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if auth.role == Role::Client {
        require_owner_or_admin(&auth, project.client_id)?;
    }

    Ok(Json(project))
}

/// Update a project
///
/// Admins may change anything; employees only status and completion.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    require_role(&auth, &[Role::Admin, Role::Employee])?;

    if auth.role == Role::Employee && req.touches_admin_fields() {
        return Err(ApiError::Forbidden(
            "Employees may only update status and completion".to_string(),
        ));
    }

    if let Some(completion) = req.completion {
        if !(0..=100).contains(&completion) {
            return Err(ApiError::BadRequest(
                "Completion must be between 0 and 100".to_string(),
            ));
        }
    }

    let before = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let project = Project::update(
        &state.db,
        id,
        UpdateProject {
            assigned_to: req.assigned_to,
            name: req.name,
            description: req.description,
            status: req.status,
            completion: req.completion,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    // Notify a newly assigned employee
    if let Some(assignee) = project.assigned_to {
        if before.assigned_to != Some(assignee) {
            notify_assignment(&state, assignee, &project).await;
        }
    }

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "update".to_string(),
            table_name: "projects".to_string(),
            record_id: Some(project.id),
            old_values: serde_json::to_value(&before).ok(),
            new_values: serde_json::to_value(&project).ok(),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(project))
}

/// Delete a project (admin only)
///
/// Cascades to the project's tasks.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_role(&auth, &[Role::Admin])?;

    let deleted = Project::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "delete".to_string(),
            table_name: "projects".to_string(),
            record_id: Some(id),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Creates an assignment notification, best-effort
async fn notify_assignment(state: &AppState, assignee: Uuid, project: &Project) {
    let result = Notification::create(
        &state.db,
        CreateNotification {
            user_id: assignee,
            title: "Project assigned".to_string(),
            message: format!("You have been assigned to {}", project.name),
        },
    )
    .await;

    if let Err(e) = result {
        tracing::warn!(project_id = %project.id, error = %e, "Failed to create assignment notification");
    }
}
