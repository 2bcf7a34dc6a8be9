/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use kanmind_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = kanmind_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use kanmind_shared::auth::middleware::token_auth_middleware;
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
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                    # Health check (public)
/// └── /api/
///     ├── POST /login/                           # Public
///     ├── POST /registration/                    # Public
///     ├── GET  /email-check/?email=              # Public
///     ├── /boards/                               # Token auth
///     │   ├── GET/POST /
///     │   └── GET/PUT/PATCH/DELETE /{board_id}/
///     └── /tasks/                                # Token auth
///         ├── GET/POST /
///         ├── GET /assigned_to_me/
///         ├── GET /reviewing/
///         ├── GET/PUT/PATCH/DELETE /{task_id}/
///         ├── GET/POST /{task_id}/comments/
///         └── DELETE /{task_id}/comments/{comment_id}/
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Token authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let public_routes = Router::new()
        .route("/api/login/", post(routes::auth::login))
        .route("/api/registration/", post(routes::auth::register))
        .route("/api/email-check/", get(routes::auth::email_check));

    // Board, task, and comment routes (require token authentication)
    let protected_routes = Router::new()
        .route(
            "/api/boards/",
            get(routes::boards::list_boards).post(routes::boards::create_board),
        )
        .route(
            "/api/boards/:board_id/",
            get(routes::boards::retrieve_board)
                .put(routes::boards::update_board)
                .patch(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        .route(
            "/api/tasks/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/api/tasks/assigned_to_me/", get(routes::tasks::assigned_to_me))
        .route("/api/tasks/reviewing/", get(routes::tasks::reviewing))
        .route(
            "/api/tasks/:task_id/",
            get(routes::tasks::retrieve_task)
                .put(routes::tasks::update_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/api/tasks/:task_id/comments/",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route(
            "/api/tasks/:task_id/comments/:comment_id/",
            delete(routes::comments::delete_comment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            token_auth_layer,
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
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Token authentication middleware layer
///
/// Resolves the `Authorization: Token <value>` header to an AuthContext in
/// the request extensions; failures surface as JSON error bodies.
async fn token_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    token_auth_middleware(state.db.clone(), req, next)
        .await
        .map_err(ApiError::from)
}
