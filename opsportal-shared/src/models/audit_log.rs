/// Audit log model and database operations
///
/// Append-only event trail written after every state-changing operation.
/// Rows record who did what to which table, the before/after values, and
/// network metadata. The application never updates or deletes them.
///
/// Writes go through [`crate::audit::AuditRecorder`], which swallows
/// failures; this module only exposes the raw append and admin reads.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE audit_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     actor_id UUID,
///     actor_email VARCHAR(255) NOT NULL,
///     action VARCHAR(50) NOT NULL,
///     table_name VARCHAR(100) NOT NULL,
///     record_id UUID,
///     old_values JSONB,
///     new_values JSONB,
///     ip_address VARCHAR(45),
///     user_agent TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// One immutable audit event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    /// Unique event ID
    pub id: Uuid,

    /// Acting user, if known (None for system actions such as webhooks)
    pub actor_id: Option<Uuid>,

    /// Actor email, or a system identifier like "payment-webhook"
    pub actor_email: String,

    /// Action identifier, e.g. "create", "update", "delete"
    pub action: String,

    /// Table the action touched
    pub table_name: String,

    /// Primary key of the touched row, if applicable
    pub record_id: Option<Uuid>,

    /// Row state before the mutation (JSON), if captured
    pub old_values: Option<JsonValue>,

    /// Row state after the mutation (JSON), if captured
    pub new_values: Option<JsonValue>,

    /// Client IP, if known
    pub ip_address: Option<String>,

    /// Client User-Agent header, if known
    pub user_agent: Option<String>,

    /// When the event was recorded
    pub created_at: DateTime<Utc>,
}

/// Input for appending an audit event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAuditLog {
    /// Acting user, if known
    pub actor_id: Option<Uuid>,

    /// Actor email or system identifier
    pub actor_email: String,

    /// Action identifier
    pub action: String,

    /// Table touched
    pub table_name: String,

    /// Row touched
    pub record_id: Option<Uuid>,

    /// Before state
    pub old_values: Option<JsonValue>,

    /// After state
    pub new_values: Option<JsonValue>,

    /// Client IP
    pub ip_address: Option<String>,

    /// Client User-Agent
    pub user_agent: Option<String>,
}

/// Filters for the admin audit log listing
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    /// Restrict to one table
    pub table_name: Option<String>,

    /// Restrict to one action
    pub action: Option<String>,

    /// Restrict to one actor
    pub actor_id: Option<Uuid>,
}

const AUDIT_COLUMNS: &str = "id, actor_id, actor_email, action, table_name, record_id, old_values, new_values, ip_address, user_agent, created_at";

impl AuditLog {
    /// Appends one audit event
    ///
    /// Callers should go through [`crate::audit::AuditRecorder`], which
    /// makes the append best-effort.
    pub async fn append(pool: &PgPool, data: NewAuditLog) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            INSERT INTO audit_logs
                (actor_id, actor_email, action, table_name, record_id,
                 old_values, new_values, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {AUDIT_COLUMNS}
            "#
        ))
        .bind(data.actor_id)
        .bind(data.actor_email)
        .bind(data.action)
        .bind(data.table_name)
        .bind(data.record_id)
        .bind(data.old_values)
        .bind(data.new_values)
        .bind(data.ip_address)
        .bind(data.user_agent)
        .fetch_one(pool)
        .await
    }

    /// Lists audit events with pagination and optional filters, newest first
    pub async fn list(
        pool: &PgPool,
        filter: AuditLogFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE TRUE");
        let mut bind_count = 0;

        if filter.table_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND table_name = ${}", bind_count));
        }
        if filter.action.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND action = ${}", bind_count));
        }
        if filter.actor_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND actor_id = ${}", bind_count));
        }

        query.push_str(&format!(
            " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            bind_count + 1,
            bind_count + 2
        ));

        let mut q = sqlx::query_as::<_, AuditLog>(&query);

        if let Some(table_name) = filter.table_name {
            q = q.bind(table_name);
        }
        if let Some(action) = filter.action {
            q = q.bind(action);
        }
        if let Some(actor_id) = filter.actor_id {
            q = q.bind(actor_id);
        }

        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Counts all audit events
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_audit_log_default() {
        let entry = NewAuditLog::default();
        assert!(entry.actor_id.is_none());
        assert!(entry.old_values.is_none());
        assert!(entry.new_values.is_none());
    }

    #[test]
    fn test_filter_default_is_unfiltered() {
        let filter = AuditLogFilter::default();
        assert!(filter.table_name.is_none());
        assert!(filter.action.is_none());
        assert!(filter.actor_id.is_none());
    }
}
