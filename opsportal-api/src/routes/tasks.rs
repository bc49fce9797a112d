/// Task endpoints
///
/// Tasks live under projects. Admins and employees mutate; clients read
/// tasks of their own projects only.
///
/// # Endpoints
///
/// - `GET    /api/projects/:id/tasks` - List a project's tasks
/// - `POST   /api/projects/:id/tasks` - Create a task (admin/employee)
/// - `GET    /api/tasks/:id` - Get a task
/// - `PUT    /api/tasks/:id` - Update a task (admin/employee)
/// - `DELETE /api/tasks/:id` - Delete a task (admin/employee)

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
        project::Project,
        task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Assigned employee, if any
    pub assigned_to: Option<Uuid>,

    /// Short title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Priority (defaults to medium)
    #[serde(default)]
    pub priority: Option<TaskPriority>,

    /// Optional due date
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Update task request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    /// Reassign (null to unassign)
    pub assigned_to: Option<Option<Uuid>>,

    /// New title
    pub title: Option<String>,

    /// New description (null to clear)
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date (null to clear)
    pub due_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
}

/// Loads a project and applies the client ownership check
async fn load_project_checked(
    state: &AppState,
    auth: &AuthContext,
    project_id: Uuid,
) -> ApiResult<Project> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if auth.role == Role::Client {
        require_owner_or_admin(auth, project.client_id)?;
    }

    Ok(project)
}

/// List a project's tasks
///
/// Clients only reach tasks of their own projects.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Vec<Task>>> {
    load_project_checked(&state, &auth, project_id).await?;

    let (limit, offset) = pagination.resolve();
    let tasks = Task::list_for_project(&state.db, project_id, limit, offset).await?;

    Ok(Json(tasks))
}

/// Create a task under a project (admin/employee)
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    require_role(&auth, &[Role::Admin, Role::Employee])?;
    req.validate()?;

    // 404 for a missing parent before any write
    Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id,
            assigned_to: req.assigned_to,
            title: req.title,
            description: req.description,
            priority: req.priority.unwrap_or(TaskPriority::Medium),
            due_date: req.due_date,
        },
    )
    .await?;

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "create".to_string(),
            table_name: "tasks".to_string(),
            record_id: Some(task.id),
            new_values: serde_json::to_value(&task).ok(),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(task))
}

/// Get a task
///
/// Clients only reach tasks of their own projects.
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    load_project_checked(&state, &auth, task.project_id).await?;

    Ok(Json(task))
}

/// Update a task (admin/employee)
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    require_role(&auth, &[Role::Admin, Role::Employee])?;

    let before = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            assigned_to: req.assigned_to,
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "update".to_string(),
            table_name: "tasks".to_string(),
            record_id: Some(task.id),
            old_values: serde_json::to_value(&before).ok(),
            new_values: serde_json::to_value(&task).ok(),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(task))
}

/// Delete a task (admin/employee)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_role(&auth, &[Role::Admin, Role::Employee])?;

    let deleted = Task::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "delete".to_string(),
            table_name: "tasks".to_string(),
            record_id: Some(id),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(serde_json::json!({ "deleted": true })))
}
