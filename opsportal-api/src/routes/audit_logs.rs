/// Audit trail endpoints (admin only)
///
/// Read-only view of the append-only audit log. Filterable by table,
/// action, and actor; always newest first.
///
/// # Endpoint
///
/// ```text
/// GET /api/audit-logs?table_name=projects&action=update&actor_id=<uuid>
/// ```

use crate::{
    app::AppState,
    error::ApiResult,
    routes::Pagination,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use opsportal_shared::{
    auth::{
        authorization::{require_role, Role},
        middleware::AuthContext,
    },
    models::audit_log::{AuditLog, AuditLogFilter},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit log query parameters
#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    /// Restrict to one table
    pub table_name: Option<String>,

    /// Restrict to one action
    pub action: Option<String>,

    /// Restrict to one actor
    pub actor_id: Option<Uuid>,

    /// Page size
    pub limit: Option<i64>,

    /// Records to skip
    pub offset: Option<i64>,
}

/// Audit log listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListAuditLogsResponse {
    /// Events on this page
    pub events: Vec<AuditLog>,

    /// Total number of recorded events
    pub total: i64,
}

/// List audit events (admin only)
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<ListAuditLogsResponse>> {
    require_role(&auth, &[Role::Admin])?;

    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve();

    let filter = AuditLogFilter {
        table_name: query.table_name,
        action: query.action,
        actor_id: query.actor_id,
    };

    let events = AuditLog::list(&state.db, filter, limit, offset).await?;
    let total = AuditLog::count(&state.db).await?;

    Ok(Json(ListAuditLogsResponse { events, total }))
}
