//! # OpsPortal Shared Library
//!
//! Shared types and business logic used by the OpsPortal API server:
//! the Session/Token Verifier and Role Gate, the Data Accessors, and the
//! Audit Recorder.
//!
//! ## Module Organization
//!
//! - `models`: database models and role-scoped queries
//! - `auth`: password hashing, session tokens, verifier middleware,
//!   role-gate helpers
//! - `db`: connection pool and migrations
//! - `audit`: best-effort audit trail writer

pub mod audit;
pub mod auth;
pub mod db;
pub mod models;

/// Current version of the OpsPortal shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
