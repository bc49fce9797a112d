/// Database models for OpsPortal
///
/// Each submodule is the Data Accessor for one entity: a struct mapped
/// with `sqlx::FromRow` plus static async CRUD functions over `&PgPool`.
/// Role scoping lives here as dedicated query functions (e.g.
/// `Project::list_for_client`) so a handler can only reach another
/// client's rows by calling the wrong accessor, not by forgetting a
/// filter.
///
/// # Models
///
/// - `user`: portal accounts with role and active flag
/// - `project`: client-owned projects worked by employees
/// - `task`: children of projects
/// - `budget`: client budgets with derived totals
/// - `order`: checkout orders mutated by the payment webhook
/// - `download_token`: bounded-use, time-limited download grants
/// - `audit_log`: append-only audit trail
/// - `notification`: in-app notifications

pub mod audit_log;
pub mod budget;
pub mod download_token;
pub mod notification;
pub mod order;
pub mod project;
pub mod task;
pub mod user;
