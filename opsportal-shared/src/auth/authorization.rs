/// Role Gate: per-endpoint allow-list authorization
///
/// Every protected endpoint declares the set of roles allowed to perform
/// its operation; the gate compares the decoded role claim against that
/// set before any data access happens. Deny paths are terminal (403) —
/// there is no partial access or field-level redaction here beyond what
/// each route selects.
///
/// # Permission Model
///
/// 1. **Role allow-list**: `require_role(&auth, &[Role::Admin, Role::Employee])`
/// 2. **Ownership**: clients may only touch rows keyed by their own user id;
///    admins bypass the ownership check (`require_owner_or_admin`)
///
/// # Example
///
/// ```
/// use opsportal_shared::auth::authorization::{require_role, Role};
/// use opsportal_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// # fn example(auth: AuthContext) -> Result<(), Box<dyn std::error::Error>> {
/// // Admin or employee may mutate projects
/// require_role(&auth, &[Role::Admin, Role::Employee])?;
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Role is not in the endpoint's allow-list
    #[error("Role {actual:?} is not permitted for this operation")]
    RoleNotAllowed {
        /// Role the caller holds
        actual: Role,
    },

    /// Caller is neither the owner of the resource nor an admin
    #[error("Not authorized to access this resource")]
    NotOwner,
}

/// Portal role attached to every user account
///
/// The role claim drives all authorization decisions. There is no
/// hierarchy: each endpoint names the exact set of roles it permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access: user management, all records, audit logs
    Admin,

    /// Staff access: read all projects/tasks/budgets, update assigned work
    Employee,

    /// Customer access: own projects, budgets, and notifications only
    Client,
}

impl Role {
    /// Converts role to string for logging and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Client => "client",
        }
    }
}

/// Checks the decoded role against an endpoint's allow-list
///
/// # Arguments
///
/// * `auth` - Authentication context from the Session/Token Verifier
/// * `allowed` - Roles permitted to perform the requested operation
///
/// # Errors
///
/// Returns `AuthzError::RoleNotAllowed` if the caller's role is not listed
pub fn require_role(auth: &AuthContext, allowed: &[Role]) -> Result<(), AuthzError> {
    if !allowed.contains(&auth.role) {
        return Err(AuthzError::RoleNotAllowed { actual: auth.role });
    }

    Ok(())
}

/// Checks that the caller owns the resource or is an admin
///
/// Clients (and employees) only pass when the resource is keyed by their
/// own user id; admins always pass.
///
/// # Arguments
///
/// * `auth` - Authentication context
/// * `owner_id` - The `client_id`/`user_id` the resource row is keyed by
///
/// # Errors
///
/// Returns `AuthzError::NotOwner` if the caller is neither owner nor admin
pub fn require_owner_or_admin(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.role == Role::Admin || auth.user_id == owner_id {
        return Ok(());
    }

    Err(AuthzError::NotOwner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_role_allow_list() {
        let admin = ctx(Role::Admin);
        let client = ctx(Role::Client);

        assert!(require_role(&admin, &[Role::Admin]).is_ok());
        assert!(require_role(&admin, &[Role::Admin, Role::Employee]).is_ok());
        assert!(require_role(&client, &[Role::Admin, Role::Employee]).is_err());
        assert!(require_role(&client, &[Role::Client]).is_ok());
    }

    #[test]
    fn test_require_owner_or_admin() {
        let client = ctx(Role::Client);

        // Owns the resource
        assert!(require_owner_or_admin(&client, client.user_id).is_ok());

        // Someone else's resource
        assert!(require_owner_or_admin(&client, Uuid::new_v4()).is_err());

        // Admin bypasses ownership
        let admin = ctx(Role::Admin);
        assert!(require_owner_or_admin(&admin, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_employee_is_not_owner_elsewhere() {
        let employee = ctx(Role::Employee);
        assert!(require_owner_or_admin(&employee, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Employee.as_str(), "employee");
        assert_eq!(Role::Client.as_str(), "client");
    }
}
