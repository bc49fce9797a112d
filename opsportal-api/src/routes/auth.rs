/// Authentication endpoints
///
/// Login issues a session token and delivers it two ways at once: in the
/// response body (for API clients) and as an `auth-token` HttpOnly cookie
/// (for browsers). A failed login returns 401 with no Set-Cookie header.
///
/// # Endpoints
///
/// - `POST /api/auth/login` - Login, sets session cookie
/// - `POST /api/auth/logout` - Clears the session cookie
/// - `GET  /api/auth/me` - Current authenticated identity

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use opsportal_shared::{
    auth::{
        jwt,
        middleware::{AuthContext, AUTH_COOKIE},
        password,
    },
    models::user::User,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Session cookie lifetime, matches the token expiration
const COOKIE_MAX_AGE_SECONDS: i64 = 24 * 60 * 60;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// User ID
    pub user_id: String,

    /// User email
    pub email: String,

    /// Portal role
    pub role: String,

    /// Session token (also set as the `auth-token` cookie)
    pub token: String,
}

/// Current identity response
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    /// User ID
    pub user_id: String,

    /// User email
    pub email: String,

    /// Display name
    pub name: Option<String>,

    /// Portal role
    pub role: String,
}

/// Builds the Set-Cookie header value for the session cookie
fn session_cookie(token: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        AUTH_COOKIE, token, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Login endpoint
///
/// Authenticates a user and returns a session token, also setting the
/// `auth-token` HttpOnly cookie.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials or deactivated account.
///   No cookie is set on failure.
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    // Find user by email
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    // Verify password
    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    // Deactivated accounts cannot log in
    if !user.active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let claims = jwt::Claims::new(user.id, user.email.clone(), user.role);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    let body = Json(LoginResponse {
        user_id: user.id.to_string(),
        email: user.email,
        role: user.role.as_str().to_string(),
        token: token.clone(),
    });

    let cookie = session_cookie(&token, COOKIE_MAX_AGE_SECONDS, state.config.api.production);
    let cookie_value = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::InternalError(format!("Invalid cookie value: {}", e)))?;

    let mut response = body.into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie_value);

    Ok(response)
}

/// Logout endpoint
///
/// Clears the session cookie. Stateless tokens are not revoked server-side;
/// the cookie expiry is the whole mechanism.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/logout
/// ```
pub async fn logout(State(state): State<AppState>) -> ApiResult<Response> {
    let cookie = session_cookie("", 0, state.config.api.production);
    let cookie_value = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::InternalError(format!("Invalid cookie value: {}", e)))?;

    let mut response = Json(serde_json::json!({ "logged_out": true })).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie_value);

    Ok(response)
}

/// Current identity endpoint
///
/// Returns the authenticated user's profile.
///
/// # Endpoint
///
/// ```text
/// GET /api/auth/me
/// Cookie: auth-token=<token>
/// ```
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        user_id: user.id.to_string(),
        email: user.email,
        name: user.name,
        role: user.role.as_str().to_string(),
    }))
}
