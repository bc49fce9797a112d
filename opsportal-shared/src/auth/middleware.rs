/// Session/Token Verifier middleware for Axum
///
/// Decodes the opaque bearer token carried by a request into a user
/// identity (id, email, role) or rejects the request. Tokens arrive
/// either in the `auth-token` cookie (browser sessions) or in the
/// `Authorization: Bearer <token>` header (API clients); the cookie is
/// checked first.
///
/// On success an [`AuthContext`] is inserted into request extensions for
/// handlers to extract with `Extension<AuthContext>`. Failure is
/// terminal: the caller gets 401 immediately, no retry.
///
/// # Example
///
/// ```no_run
/// use axum::{Extension, Router, routing::get, middleware};
/// use opsportal_shared::auth::middleware::{session_auth_middleware, AuthContext};
///
/// async fn protected(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.email)
/// }
///
/// let app: Router = Router::new()
///     .route("/me", get(protected))
///     .layer(middleware::from_fn(move |req, next| {
///         session_auth_middleware("your-jwt-secret".to_string(), req, next)
///     }));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authorization::Role;
use super::jwt::{validate_token, JwtError};

/// Cookie that carries the session token for browser clients
pub const AUTH_COOKIE: &str = "auth-token";

/// Authentication context added to request extensions
///
/// The decoded identity every protected handler works with. Handlers
/// extract it via Axum's `Extension` extractor after the verifier ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email at token-issue time
    pub email: String,

    /// Portal role driving all authorization checks
    pub role: Role,
}

/// Error type for the Session/Token Verifier
#[derive(Debug)]
pub enum AuthError {
    /// No token in cookie or Authorization header
    MissingCredentials,

    /// Authorization header present but not `Bearer <token>`
    InvalidFormat(String),

    /// Token failed signature, issuer, or expiry validation
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
        }
    }
}

/// Extracts the session token from a request's headers
///
/// Checks the `auth-token` cookie first, then the `Authorization: Bearer`
/// header.
///
/// # Errors
///
/// - `MissingCredentials` if neither carrier is present
/// - `InvalidFormat` if the Authorization header is not a Bearer token
pub fn extract_token(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(token) = token_from_cookie(headers) {
        return Ok(token);
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    Ok(token.to_string())
}

/// Reads the `auth-token` cookie value, if any
fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == AUTH_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Verifies a request's session token and decodes the identity
///
/// This is the pure core of the middleware, reusable from tests and from
/// the api crate's middleware layer.
///
/// # Errors
///
/// Returns an [`AuthError`] when the token is absent, malformed, or
/// fails validation
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = extract_token(headers)?;

    let claims = validate_token(&token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    Ok(AuthContext {
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}

/// Session authentication middleware
///
/// Validates the session token and adds [`AuthContext`] to request
/// extensions.
///
/// # Errors
///
/// Returns 401 Unauthorized if the token is missing, malformed, expired,
/// or otherwise invalid
pub async fn session_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_context = authenticate(req.headers(), &secret)?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.com", Role::Client);
        let token = create_token(&claims, SECRET).unwrap();

        let headers = headers_with_cookie(&format!("theme=dark; auth-token={}", token));
        assert_eq!(extract_token(&headers).unwrap(), token);
    }

    #[test]
    fn test_extract_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer some-token"),
        );

        assert_eq!(extract_token(&headers).unwrap(), "some-token");
    }

    #[test]
    fn test_missing_credentials() {
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_token(&headers),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_malformed_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );

        assert!(matches!(
            extract_token(&headers),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_authenticate_decodes_identity() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "a@b.com", Role::Employee);
        let token = create_token(&claims, SECRET).unwrap();

        let headers = headers_with_cookie(&format!("auth-token={}", token));
        let auth = authenticate(&headers, SECRET).unwrap();

        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.email, "a@b.com");
        assert_eq!(auth.role, Role::Employee);
    }

    #[test]
    fn test_authenticate_rejects_garbage_token() {
        let headers = headers_with_cookie("auth-token=not-a-jwt");
        assert!(matches!(
            authenticate(&headers, SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidFormat("x".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidToken("x".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
