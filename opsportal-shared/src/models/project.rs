/// Project model and database operations
///
/// Projects are owned by a client and worked on by employees. Status is
/// a plain enumeration mutated directly by whichever role is authorized;
/// no transition table is enforced.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM (
///     'pending', 'in_progress', 'completed', 'cancelled'
/// );
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     client_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     status project_status NOT NULL DEFAULT 'pending',
///     completion INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Project status enumeration
///
/// No transitions are enforced; any authorized mutation may set any
/// status directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created, work not started
    Pending,

    /// Being worked on
    InProgress,

    /// Finished
    Completed,

    /// Abandoned
    Cancelled,
}

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Client (user with role `client`) who owns this project
    pub client_id: Uuid,

    /// Employee assigned to the project, if any
    pub assigned_to: Option<Uuid>,

    /// Project name
    pub name: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Current status
    pub status: ProjectStatus,

    /// Completion percentage (0-100)
    pub completion: i32,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Owning client
    pub client_id: Uuid,

    /// Assigned employee, if any
    pub assigned_to: Option<Uuid>,

    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,
}

/// Input for updating a project
///
/// All fields optional; only non-None fields are written (last write wins).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    /// Reassign to another employee (use Some(None) to unassign)
    pub assigned_to: Option<Option<Uuid>>,

    /// New name
    pub name: Option<String>,

    /// New description (use Some(None) to clear)
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<ProjectStatus>,

    /// New completion percentage (0-100)
    pub completion: Option<i32>,
}

const PROJECT_COLUMNS: &str = "id, client_id, assigned_to, name, description, status, completion, created_at, updated_at";

impl Project {
    /// Creates a new project in pending state
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (client_id, assigned_to, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(data.client_id)
        .bind(data.assigned_to)
        .bind(data.name)
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Updates a project (last write wins, no version check)
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }
        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.completion.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completion = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {PROJECT_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);

        if let Some(assigned_opt) = data.assigned_to {
            q = q.bind(assigned_opt);
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description_opt) = data.description {
            q = q.bind(description_opt);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(completion) = data.completion {
            q = q.bind(completion);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a project (cascades to its tasks)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all projects with pagination, newest first (admin/employee view)
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Lists projects owned by one client (client view, role-scoped)
    pub async fn list_for_client(
        pool: &PgPool,
        client_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE client_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(client_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts all projects
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
