/// User management endpoints (admin only)
///
/// There is no public registration: admins provision accounts and assign
/// roles here. Deactivation (`active=false`) takes effect at the next
/// login attempt; existing tokens expire on their own.
///
/// # Endpoints
///
/// - `GET    /api/users` - List users (paginated)
/// - `POST   /api/users` - Create user
/// - `GET    /api/users/:id` - Get user
/// - `PUT    /api/users/:id` - Update user (role, name, password, active)
/// - `DELETE /api/users/:id` - Delete user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
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
        authorization::{require_role, Role},
        middleware::AuthContext,
        password,
    },
    models::{
        audit_log::NewAuditLog,
        user::{CreateUser, UpdateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Initial password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Optional display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    /// Portal role
    pub role: Role,
}

/// Update user request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// New password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    /// New display name
    pub name: Option<Option<String>>,

    /// New role
    pub role: Option<Role>,

    /// Activate or deactivate the account
    pub active: Option<bool>,
}

/// User as returned to admins (no password hash)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Display name
    pub name: Option<String>,

    /// Portal role
    pub role: String,

    /// Whether the account can log in
    pub active: bool,

    /// Created at
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Last login, if any
    pub last_login_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role.as_str().to_string(),
            active: user.active,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// List users response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListUsersResponse {
    /// Users on this page
    pub users: Vec<UserResponse>,

    /// Total number of users
    pub total: i64,
}

/// List users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<ListUsersResponse>> {
    require_role(&auth, &[Role::Admin])?;

    let (limit, offset) = pagination.resolve();
    let users = User::list(&state.db, limit, offset).await?;
    let total = User::count(&state.db).await?;

    Ok(Json(ListUsersResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
        total,
    }))
}

/// Create a user (admin only)
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    require_role(&auth, &[Role::Admin])?;
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            name: req.name,
            role: req.role,
        },
    )
    .await?;

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "create".to_string(),
            table_name: "users".to_string(),
            record_id: Some(user.id),
            new_values: serde_json::to_value(&user).ok(),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(user.into()))
}

/// Get a user by ID (admin only)
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    require_role(&auth, &[Role::Admin])?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Update a user (admin only)
///
/// Password changes are re-hashed here; everything else is written as
/// given. Setting `active=false` blocks future logins.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    require_role(&auth, &[Role::Admin])?;
    req.validate()?;

    let before = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let password_hash = match &req.password {
        Some(password) => {
            password::validate_password_strength(password).map_err(|e| {
                ApiError::ValidationError(vec![ValidationErrorDetail {
                    field: "password".to_string(),
                    message: e,
                }])
            })?;
            Some(password::hash_password(password)?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            email: req.email,
            password_hash,
            name: req.name,
            role: req.role,
            active: req.active,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "update".to_string(),
            table_name: "users".to_string(),
            record_id: Some(user.id),
            old_values: serde_json::to_value(&before).ok(),
            new_values: serde_json::to_value(&user).ok(),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(user.into()))
}

/// Delete a user (admin only)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_role(&auth, &[Role::Admin])?;

    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "delete".to_string(),
            table_name: "users".to_string(),
            record_id: Some(id),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(serde_json::json!({ "deleted": true })))
}
