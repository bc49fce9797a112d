/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use opsportal_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = opsportal_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{request_meta::capture_request_meta, security::SecurityHeadersLayer},
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use opsportal_shared::auth::middleware::authenticate;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the session token signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Gets the payment webhook signing secret
    pub fn webhook_secret(&self) -> &str {
        &self.config.payment.webhook_secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /api/
///     ├── /auth/login               # POST, public
///     ├── /auth/logout              # POST, public (clears cookie)
///     ├── /auth/me                  # GET, authenticated
///     ├── /orders                   # POST public checkout, GET admin list
///     ├── /orders/:id               # GET, admin
///     ├── /webhooks/payment         # POST, signature-verified
///     ├── /download/:token          # GET, public (bounded-use grant)
///     ├── /users[/:id]              # admin-only CRUD
///     ├── /projects[/:id]           # role-scoped CRUD
///     ├── /projects/:id/tasks       # role-scoped
///     ├── /tasks/:id                # role-scoped
///     ├── /budgets[/:id]            # role-scoped CRUD
///     ├── /notifications            # own notifications
///     └── /audit-logs               # admin-only
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Request metadata capture (IP / User-Agent for audit events)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Security headers
/// 5. Session verification (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public routes: no session required. The webhook and download
    // endpoints do their own verification (signature, opaque token).
    let public_api = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/orders", post(routes::orders::checkout))
        .route("/webhooks/payment", post(routes::webhooks::payment_webhook))
        .route("/download/:token", get(routes::downloads::redeem_download));

    // Protected routes: Session Verifier runs first, handlers extract
    // AuthContext and apply the Role Gate per endpoint.
    let protected_api = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/budgets",
            get(routes::budgets::list_budgets).post(routes::budgets::create_budget),
        )
        .route(
            "/budgets/:id",
            get(routes::budgets::get_budget)
                .put(routes::budgets::update_budget)
                .delete(routes::budgets::delete_budget),
        )
        .route("/orders", get(routes::orders::list_orders))
        .route("/orders/:id", get(routes::orders::get_order))
        .route(
            "/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            get(routes::notifications::unread_count),
        )
        .route(
            "/notifications/:id/read",
            post(routes::notifications::mark_read),
        )
        .route("/audit-logs", get(routes::audit_logs::list_audit_logs))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::COOKIE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", public_api.merge(protected_api))
        .layer(axum::middleware::from_fn(capture_request_meta))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Session verification middleware layer
///
/// Decodes the session token from the `auth-token` cookie or the
/// Authorization header, then injects AuthContext into request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
