/// Authentication and authorization utilities
///
/// This module implements the front half of the request pipeline:
/// Session/Token Verifier followed by the Role Gate.
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`jwt`]: Session token generation and validation
/// - [`middleware`]: Axum middleware decoding the `auth-token` cookie /
///   Bearer header into an `AuthContext`
/// - [`authorization`]: Role allow-list and ownership checks
///
/// # Example
///
/// ```no_run
/// use opsportal_shared::auth::password::{hash_password, verify_password};
/// use opsportal_shared::auth::jwt::{create_token, Claims};
/// use opsportal_shared::auth::authorization::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password_1")?;
/// assert!(verify_password("user_password_1", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "ana@example.com", Role::Client);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
