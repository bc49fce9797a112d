/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, logout, current identity
/// - `users`: Admin-only account management
/// - `projects`: Role-scoped project CRUD
/// - `tasks`: Tasks under projects
/// - `budgets`: Budgets with derived totals
/// - `orders`: Public checkout and admin order views
/// - `webhooks`: Payment-provider webhook
/// - `downloads`: Bounded-use download grants
/// - `notifications`: Per-user notifications
/// - `audit_logs`: Admin view of the audit trail

use serde::Deserialize;

/// Pagination query parameters shared by the list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    /// Page size (default 50, capped at 100)
    pub limit: Option<i64>,

    /// Number of records to skip (default 0)
    pub offset: Option<i64>,
}

impl Pagination {
    /// Returns the effective (limit, offset) pair
    pub fn resolve(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(50).clamp(1, 100);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

pub mod audit_logs;
pub mod auth;
pub mod budgets;
pub mod downloads;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod projects;
pub mod tasks;
pub mod users;
pub mod webhooks;
