/// Order endpoints
///
/// Checkout is public: anyone can create a pending order. The amount is
/// computed server-side from the submitted line items when present; a
/// flat `amount_cents` is accepted otherwise. Orders move to `paid` or
/// `failed` only through the payment webhook. Listing and reading orders
/// is admin-only.
///
/// # Endpoints
///
/// - `POST /api/orders` - Public checkout, creates a pending order
/// - `GET  /api/orders` - List orders (admin)
/// - `GET  /api/orders/:id` - Get an order (admin)

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
        authorization::{require_role, Role},
        middleware::AuthContext,
    },
    models::{
        audit_log::NewAuditLog,
        order::{CreateOrder, Order},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A checkout line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItem {
    /// What is being bought
    pub description: String,

    /// Quantity
    pub quantity: i64,

    /// Price per unit in cents
    pub unit_price_cents: i64,
}

/// Checkout request
#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    /// Customer display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub customer_name: String,

    /// Customer email
    #[validate(email(message = "Invalid email format"))]
    pub customer_email: String,

    /// Line items; when present the amount is computed from these
    pub items: Option<Vec<CheckoutItem>>,

    /// Flat amount in cents, used when no items are given
    pub amount_cents: Option<i64>,

    /// ISO 4217 currency code (default "eur")
    pub currency: Option<String>,

    /// Payment-provider intent id, if the checkout flow created one
    pub payment_intent_id: Option<String>,
}

/// Checkout response
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// Order ID
    pub order_id: Uuid,

    /// Amount in cents (server-computed)
    pub amount_cents: i64,

    /// Currency
    pub currency: String,

    /// Order status (always "pending" at checkout)
    pub status: String,
}

/// Resolves the order amount: item sum wins over a flat amount
fn resolve_amount(req: &CheckoutRequest) -> ApiResult<i64> {
    if let Some(items) = &req.items {
        if items.is_empty() {
            return Err(ApiError::BadRequest("Items must not be empty".to_string()));
        }
        for item in items {
            if item.quantity <= 0 || item.unit_price_cents < 0 {
                return Err(ApiError::BadRequest(
                    "Item quantities must be positive and prices non-negative".to_string(),
                ));
            }
        }
        // Saturating keeps absurd inputs from wrapping the total
        return Ok(items.iter().fold(0i64, |total, i| {
            total.saturating_add(i.quantity.saturating_mul(i.unit_price_cents))
        }));
    }

    match req.amount_cents {
        Some(amount) if amount > 0 => Ok(amount),
        _ => Err(ApiError::BadRequest(
            "Either items or a positive amount_cents is required".to_string(),
        )),
    }
}

/// Public checkout endpoint
///
/// Creates a pending order. Payment confirmation arrives later through
/// the webhook, never through this endpoint.
pub async fn checkout(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    req.validate()?;

    let amount_cents = resolve_amount(&req)?;
    let currency = req.currency.unwrap_or_else(|| "eur".to_string());

    let order = Order::create(
        &state.db,
        CreateOrder {
            customer_name: req.customer_name,
            customer_email: req.customer_email.clone(),
            amount_cents,
            currency,
            payment_intent_id: req.payment_intent_id,
        },
    )
    .await?;

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_email: req.customer_email,
            action: "create".to_string(),
            table_name: "orders".to_string(),
            record_id: Some(order.id),
            new_values: serde_json::to_value(&order).ok(),
            ip_address: meta.ip,
            user_agent: meta.user_agent,
            ..Default::default()
        },
    )
    .await;

    Ok(Json(CheckoutResponse {
        order_id: order.id,
        amount_cents: order.amount_cents,
        currency: order.currency,
        status: "pending".to_string(),
    }))
}

/// List orders (admin only)
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Vec<Order>>> {
    require_role(&auth, &[Role::Admin])?;

    let (limit, offset) = pagination.resolve();
    let orders = Order::list(&state.db, limit, offset).await?;

    Ok(Json(orders))
}

/// Get an order (admin only)
pub async fn get_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    require_role(&auth, &[Role::Admin])?;

    let order = Order::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CheckoutRequest {
        CheckoutRequest {
            customer_name: "Ana".to_string(),
            customer_email: "ana@example.com".to_string(),
            items: None,
            amount_cents: None,
            currency: None,
            payment_intent_id: None,
        }
    }

    #[test]
    fn test_amount_from_items() {
        let mut req = base_request();
        req.items = Some(vec![
            CheckoutItem {
                description: "Design".to_string(),
                quantity: 2,
                unit_price_cents: 50,
            },
            CheckoutItem {
                description: "Hosting".to_string(),
                quantity: 1,
                unit_price_cents: 300,
            },
        ]);

        assert_eq!(resolve_amount(&req).unwrap(), 400);
    }

    #[test]
    fn test_flat_amount_when_no_items() {
        let mut req = base_request();
        req.amount_cents = Some(1250);

        assert_eq!(resolve_amount(&req).unwrap(), 1250);
    }

    #[test]
    fn test_rejects_missing_amount() {
        let req = base_request();
        assert!(resolve_amount(&req).is_err());
    }

    #[test]
    fn test_rejects_nonpositive_quantity() {
        let mut req = base_request();
        req.items = Some(vec![CheckoutItem {
            description: "Design".to_string(),
            quantity: 0,
            unit_price_cents: 50,
        }]);

        assert!(resolve_amount(&req).is_err());
    }
}
