/// Common test utilities for integration tests
///
/// Shared infrastructure for the API integration tests:
/// - Test database setup and migrations
/// - Test users for each role with session tokens
/// - Request helpers that exercise the cookie auth path

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use opsportal_api::app::{build_router, AppState};
use opsportal_api::config::Config;
use opsportal_shared::auth::authorization::Role;
use opsportal_shared::auth::jwt::{create_token, Claims};
use opsportal_shared::models::user::{CreateUser, User};
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub run_id: Uuid,
    pub admin: User,
    pub admin_token: String,
    pub employee: User,
    pub employee_token: String,
    pub client: User,
    pub client_token: String,
    pub other_client: User,
    pub other_client_token: String,
}

impl TestContext {
    /// Creates a new test context with a migrated database and one user
    /// per role
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Migrations path is relative to the crate's Cargo.toml
        sqlx::migrate!("../migrations").run(&db).await?;

        let run_id = Uuid::new_v4();

        let admin = create_test_user(&db, run_id, "admin", Role::Admin).await?;
        let employee = create_test_user(&db, run_id, "employee", Role::Employee).await?;
        let client = create_test_user(&db, run_id, "client", Role::Client).await?;
        let other_client = create_test_user(&db, run_id, "client2", Role::Client).await?;

        let admin_token = token_for(&admin, &config)?;
        let employee_token = token_for(&employee, &config)?;
        let client_token = token_for(&client, &config)?;
        let other_client_token = token_for(&other_client, &config)?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            run_id,
            admin,
            admin_token,
            employee,
            employee_token,
            client,
            client_token,
            other_client,
            other_client_token,
        })
    }

    /// Sends a request carrying the session token in the auth cookie
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        self.request_with_headers(method, path, token, &[], body)
            .await
    }

    /// Sends a request with extra headers on top of the auth cookie
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            builder = builder.header("cookie", format!("auth-token={}", token));
        }

        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.app.clone().call(request).await.unwrap()
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response<Body> {
        self.request("GET", path, token, None).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.request("POST", path, token, Some(body)).await
    }

    pub async fn put_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.request("PUT", path, token, Some(body)).await
    }

    /// Cleans up rows created by this context
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM orders WHERE customer_email LIKE $1")
            .bind(format!("%{}%", self.run_id))
            .execute(&self.db)
            .await?;

        for user in [&self.admin, &self.employee, &self.client, &self.other_client] {
            User::delete(&self.db, user.id).await?;
        }

        Ok(())
    }
}

/// Creates one test user with a placeholder password hash
///
/// Tests that exercise the real login path create their own user with a
/// properly hashed password.
async fn create_test_user(
    db: &PgPool,
    run_id: Uuid,
    label: &str,
    role: Role,
) -> anyhow::Result<User> {
    let user = User::create(
        db,
        CreateUser {
            email: format!("{}-{}@example.com", label, run_id),
            password_hash: "test_hash".to_string(),
            name: Some(format!("Test {}", label)),
            role,
        },
    )
    .await?;

    Ok(user)
}

/// Issues a session token for a test user
fn token_for(user: &User, config: &Config) -> anyhow::Result<String> {
    let claims = Claims::new(user.id, user.email.clone(), user.role);
    Ok(create_token(&claims, &config.jwt.secret)?)
}

/// Reads and parses a JSON response body
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Asserts a status, printing the body on mismatch
pub async fn assert_status(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or_default();

    assert_eq!(status, expected, "unexpected status, body: {}", body);
    body
}
