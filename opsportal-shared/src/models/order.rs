/// Order model and database operations
///
/// Orders are created at checkout and mutated by the payment webhook.
/// The `payment_intent_id` correlates an order with the provider-side
/// payment; the provider client itself lives outside this service.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE order_status AS ENUM ('pending', 'paid', 'failed', 'refunded');
///
/// CREATE TABLE orders (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     customer_name VARCHAR(255) NOT NULL,
///     customer_email CITEXT NOT NULL,
///     amount_cents BIGINT NOT NULL,
///     currency VARCHAR(3) NOT NULL DEFAULT 'eur',
///     status order_status NOT NULL DEFAULT 'pending',
///     payment_intent_id VARCHAR(255) UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Order status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Awaiting payment confirmation
    Pending,

    /// Payment confirmed by the provider webhook
    Paid,

    /// Payment failed
    Failed,

    /// Refunded after payment
    Refunded,
}

/// Order model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    /// Unique order ID
    pub id: Uuid,

    /// Customer display name
    pub customer_name: String,

    /// Customer email (case-insensitive)
    pub customer_email: String,

    /// Amount in cents
    pub amount_cents: i64,

    /// ISO 4217 currency code, lowercase
    pub currency: String,

    /// Current status
    pub status: OrderStatus,

    /// Provider payment intent correlating this order with the webhook
    pub payment_intent_id: Option<String>,

    /// When the order was created
    pub created_at: DateTime<Utc>,

    /// When the order was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new order at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    /// Customer display name
    pub customer_name: String,

    /// Customer email
    pub customer_email: String,

    /// Amount in cents
    pub amount_cents: i64,

    /// ISO 4217 currency code
    pub currency: String,

    /// Provider payment intent, if the checkout flow created one
    pub payment_intent_id: Option<String>,
}

const ORDER_COLUMNS: &str = "id, customer_name, customer_email, amount_cents, currency, status, payment_intent_id, created_at, updated_at";

impl Order {
    /// Creates a new order in pending state
    pub async fn create(pool: &PgPool, data: CreateOrder) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (customer_name, customer_email, amount_cents, currency, payment_intent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(data.customer_name)
        .bind(data.customer_email)
        .bind(data.amount_cents)
        .bind(data.currency)
        .bind(data.payment_intent_id)
        .fetch_one(pool)
        .await
    }

    /// Finds an order by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds an order by its provider payment intent
    ///
    /// This is the lookup the payment webhook performs.
    pub async fn find_by_payment_intent(
        pool: &PgPool,
        payment_intent_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_intent_id = $1"
        ))
        .bind(payment_intent_id)
        .fetch_optional(pool)
        .await
    }

    /// Sets the order status (last write wins)
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Lists all orders with pagination, newest first (admin view)
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
