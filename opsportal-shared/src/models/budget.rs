/// Budget model and database operations
///
/// A budget belongs to a client and holds a list of line items. The
/// stored total is a pure function of the items: the accessor always
/// recomputes `total_cents = Σ(quantity × unit_price_cents)` on every
/// write and ignores any caller-supplied total.
///
/// Amounts are integer cents throughout; no floating point.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE budget_status AS ENUM ('draft', 'sent', 'approved', 'rejected');
///
/// CREATE TABLE budgets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     client_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     items JSONB NOT NULL DEFAULT '[]',
///     total_cents BIGINT NOT NULL DEFAULT 0,
///     status budget_status NOT NULL DEFAULT 'draft',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Budget status enumeration (no enforced transitions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "budget_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Being drafted
    Draft,

    /// Sent to the client
    Sent,

    /// Accepted by the client
    Approved,

    /// Declined by the client
    Rejected,
}

/// One line item of a budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItem {
    /// What is being billed
    pub description: String,

    /// Number of units
    pub quantity: i64,

    /// Price per unit in cents
    pub unit_price_cents: i64,
}

impl BudgetItem {
    /// Line subtotal in cents, saturating at the i64 bounds
    pub fn subtotal_cents(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price_cents)
    }
}

/// Computes a budget total from its items
///
/// `total_cents == Σ(item.quantity × item.unit_price_cents)` is the
/// invariant every stored budget satisfies. Arithmetic saturates instead
/// of wrapping; the API layer caps item magnitudes well below the point
/// where saturation could occur.
pub fn total_cents(items: &[BudgetItem]) -> i64 {
    items
        .iter()
        .fold(0i64, |total, item| total.saturating_add(item.subtotal_cents()))
}

/// Budget model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Budget {
    /// Unique budget ID
    pub id: Uuid,

    /// Client this budget belongs to
    pub client_id: Uuid,

    /// Budget title
    pub title: String,

    /// Line items (stored as JSONB)
    pub items: Json<Vec<BudgetItem>>,

    /// Total in cents, always Σ(quantity × unit_price_cents)
    pub total_cents: i64,

    /// Current status
    pub status: BudgetStatus,

    /// When the budget was created
    pub created_at: DateTime<Utc>,

    /// When the budget was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new budget
///
/// No total field: the total is derived from the items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBudget {
    /// Owning client
    pub client_id: Uuid,

    /// Budget title
    pub title: String,

    /// Line items
    pub items: Vec<BudgetItem>,
}

/// Input for updating a budget
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBudget {
    /// New title
    pub title: Option<String>,

    /// Replacement line items (total is recomputed)
    pub items: Option<Vec<BudgetItem>>,

    /// New status
    pub status: Option<BudgetStatus>,
}

const BUDGET_COLUMNS: &str =
    "id, client_id, title, items, total_cents, status, created_at, updated_at";

impl Budget {
    /// Creates a new budget in draft state
    ///
    /// The stored total is computed from `data.items`.
    pub async fn create(pool: &PgPool, data: CreateBudget) -> Result<Self, sqlx::Error> {
        let total = total_cents(&data.items);

        sqlx::query_as::<_, Budget>(&format!(
            r#"
            INSERT INTO budgets (client_id, title, items, total_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING {BUDGET_COLUMNS}
            "#
        ))
        .bind(data.client_id)
        .bind(data.title)
        .bind(Json(data.items))
        .bind(total)
        .fetch_one(pool)
        .await
    }

    /// Finds a budget by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Budget>(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Updates a budget
    ///
    /// When `items` is present the total is recomputed alongside, so the
    /// invariant holds after every write.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateBudget,
    ) -> Result<Option<Self>, sqlx::Error> {
        let total = data.items.as_deref().map(total_cents);

        let mut query = String::from("UPDATE budgets SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.items.is_some() {
            bind_count += 1;
            query.push_str(&format!(", items = ${}", bind_count));
            bind_count += 1;
            query.push_str(&format!(", total_cents = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {BUDGET_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Budget>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(items) = data.items {
            q = q.bind(Json(items));
            q = q.bind(total.unwrap_or(0));
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a budget
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all budgets with pagination (admin/employee view)
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Budget>(&format!(
            r#"
            SELECT {BUDGET_COLUMNS}
            FROM budgets
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Lists budgets of one client (client view, role-scoped)
    pub async fn list_for_client(
        pool: &PgPool,
        client_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Budget>(&format!(
            r#"
            SELECT {BUDGET_COLUMNS}
            FROM budgets
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
}
