/// Notification endpoints
///
/// Every authenticated user works with their own notifications only;
/// there is no cross-user access in any role.
///
/// # Endpoints
///
/// - `GET  /api/notifications` - List own notifications (paginated)
/// - `GET  /api/notifications/unread-count` - Count own unread
/// - `POST /api/notifications/:id/read` - Mark one of your own read

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::Pagination,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use opsportal_shared::{
    auth::middleware::AuthContext,
    models::notification::Notification,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unread count response
#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    /// Number of unread notifications
    pub unread: i64,
}

/// List the caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Vec<Notification>>> {
    let (limit, offset) = pagination.resolve();
    let notifications =
        Notification::list_for_user(&state.db, auth.user_id, limit, offset).await?;

    Ok(Json(notifications))
}

/// Count the caller's unread notifications
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UnreadCountResponse>> {
    let unread = Notification::unread_count(&state.db, auth.user_id).await?;

    Ok(Json(UnreadCountResponse { unread }))
}

/// Mark one of the caller's notifications read
///
/// The ownership guard lives in the UPDATE: someone else's notification
/// id reads as not found.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    let notification = Notification::mark_read(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}
