/// Budget endpoints
///
/// Budgets carry line items; `total_cents` is never accepted from the
/// client, it is recomputed from the items on every write. Admins create,
/// update, and delete; employees read everything; clients read their own.
///
/// # Endpoints
///
/// - `GET    /api/budgets` - List (scope depends on role)
/// - `POST   /api/budgets` - Create (admin)
/// - `GET    /api/budgets/:id` - Get
/// - `PUT    /api/budgets/:id` - Update (admin)
/// - `DELETE /api/budgets/:id` - Delete (admin)

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
        budget::{Budget, BudgetItem, BudgetStatus, CreateBudget, UpdateBudget},
        notification::{CreateNotification, Notification},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create budget request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBudgetRequest {
    /// Owning client
    pub client_id: Uuid,

    /// Budget title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Line items; the total is derived from these
    pub items: Vec<BudgetItem>,
}

/// Update budget request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBudgetRequest {
    /// New title
    pub title: Option<String>,

    /// Replacement line items (total is recomputed)
    pub items: Option<Vec<BudgetItem>>,

    /// New status
    pub status: Option<BudgetStatus>,
}

/// Largest accepted quantity or unit price per line item
///
/// Keeps every line subtotal well inside i64 range so stored totals
/// stay exact.
const MAX_ITEM_MAGNITUDE: i64 = 1_000_000_000;

/// Rejects negative or oversized quantities and prices before they reach
/// the total
fn validate_items(items: &[BudgetItem]) -> ApiResult<()> {
    for item in items {
        if item.quantity < 0 || item.unit_price_cents < 0 {
            return Err(ApiError::BadRequest(
                "Item quantities and prices must be non-negative".to_string(),
            ));
        }
        if item.quantity > MAX_ITEM_MAGNITUDE || item.unit_price_cents > MAX_ITEM_MAGNITUDE {
            return Err(ApiError::BadRequest(format!(
                "Item quantities and prices must not exceed {}",
                MAX_ITEM_MAGNITUDE
            )));
        }
    }
    Ok(())
}

/// List budgets, scoped by role
pub async fn list_budgets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Vec<Budget>>> {
    let (limit, offset) = pagination.resolve();

    let budgets = match auth.role {
        Role::Admin | Role::Employee => Budget::list(&state.db, limit, offset).await?,
        Role::Client => Budget::list_for_client(&state.db, auth.user_id, limit, offset).await?,
    };

    Ok(Json(budgets))
}

/// Create a budget (admin only)
///
/// The stored total is computed from the items; the client is notified.
pub async fn create_budget(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(req): Json<CreateBudgetRequest>,
) -> ApiResult<Json<Budget>> {
    require_role(&auth, &[Role::Admin])?;
    req.validate()?;
    validate_items(&req.items)?;

    let budget = Budget::create(
        &state.db,
        CreateBudget {
            client_id: req.client_id,
            title: req.title,
            items: req.items,
        },
    )
    .await?;

    let notify = Notification::create(
        &state.db,
        CreateNotification {
            user_id: budget.client_id,
            title: "New budget".to_string(),
            message: format!("A budget is ready for you: {}", budget.title),
        },
    )
    .await;

    if let Err(e) = notify {
        tracing::warn!(budget_id = %budget.id, error = %e, "Failed to create budget notification");
    }

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "create".to_string(),
            table_name: "budgets".to_string(),
            record_id: Some(budget.id),
            new_values: serde_json::to_value(&budget).ok(),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(budget))
}

/// Get a budget
///
/// Clients only see their own budgets.
pub async fn get_budget(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Budget>> {
    let budget = Budget::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Budget not found".to_string()))?;

    if auth.role == Role::Client {
        require_owner_or_admin(&auth, budget.client_id)?;
    }

    Ok(Json(budget))
}

/// Update a budget (admin only)
///
/// Replacing the items recomputes the stored total.
pub async fn update_budget(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBudgetRequest>,
) -> ApiResult<Json<Budget>> {
    require_role(&auth, &[Role::Admin])?;

    if let Some(items) = &req.items {
        validate_items(items)?;
    }

    let before = Budget::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Budget not found".to_string()))?;

    let budget = Budget::update(
        &state.db,
        id,
        UpdateBudget {
            title: req.title,
            items: req.items,
            status: req.status,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Budget not found".to_string()))?;

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "update".to_string(),
            table_name: "budgets".to_string(),
            record_id: Some(budget.id),
            old_values: serde_json::to_value(&before).ok(),
            new_values: serde_json::to_value(&budget).ok(),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(budget))
}

/// Delete a budget (admin only)
pub async fn delete_budget(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_role(&auth, &[Role::Admin])?;

    let deleted = Budget::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Budget not found".to_string()));
    }

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_id: Some(auth.user_id),
            actor_email: auth.email.clone(),
            action: "delete".to_string(),
            table_name: "budgets".to_string(),
            record_id: Some(id),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, unit_price_cents: i64) -> BudgetItem {
        BudgetItem {
            description: "work".to_string(),
            quantity,
            unit_price_cents,
        }
    }

    #[test]
    fn test_rejects_negative_items() {
        assert!(validate_items(&[item(-1, 100)]).is_err());
        assert!(validate_items(&[item(1, -100)]).is_err());
    }

    #[test]
    fn test_rejects_oversized_items() {
        assert!(validate_items(&[item(MAX_ITEM_MAGNITUDE + 1, 1)]).is_err());
        assert!(validate_items(&[item(1, i64::MAX)]).is_err());
    }

    #[test]
    fn test_accepts_items_at_the_cap() {
        assert!(validate_items(&[item(MAX_ITEM_MAGNITUDE, MAX_ITEM_MAGNITUDE)]).is_ok());
        assert!(validate_items(&[item(0, 0)]).is_ok());
    }
}
