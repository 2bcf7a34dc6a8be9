/// Token authentication middleware for Axum
///
/// This module resolves the `Authorization: Token <value>` header to an
/// authenticated user. On success an `AuthContext` lands in the request
/// extensions for handlers to extract.
///
/// # Request Extensions
///
/// After successful authentication, middleware adds:
/// - `AuthContext`: the requester's id, email, and fullname
///
/// # Example
///
/// ```no_run
/// use axum::{Extension, Router, routing::get};
/// use kanmind_shared::auth::middleware::AuthContext;
///
/// async fn protected_handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.fullname)
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::auth_token::AuthToken;

/// Authentication context added to request extensions
///
/// Handlers extract it with Axum's `Extension` extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Authenticated user's email
    pub email: String,

    /// Authenticated user's fullname
    pub fullname: String,
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token lookup failed (unknown or revoked token)
    InvalidToken,

    /// Database error
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Invalid token").into_response()
            }
            AuthError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Token authentication middleware
///
/// Validates opaque tokens from the `Authorization: Token <value>` header.
/// The presented token is hashed and looked up in the auth_tokens table.
///
/// # Errors
///
/// - 401 when the Authorization header is missing or the token is unknown
/// - 400 when the header is not in `Token <value>` form
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, Router, routing::get};
/// use kanmind_shared::auth::middleware::token_auth_middleware;
/// use sqlx::PgPool;
///
/// async fn handler() -> &'static str {
///     "Protected route"
/// }
///
/// fn router(pool: PgPool) -> Router {
///     Router::new()
///         .route("/protected", get(handler))
///         .layer(middleware::from_fn(move |req, next| {
///             token_auth_middleware(pool.clone(), req, next)
///         }))
/// }
/// ```
pub async fn token_auth_middleware(
    pool: PgPool,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    // Parse "Token <value>"
    let token = auth_header
        .strip_prefix("Token ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Token credential".to_string()))?;

    // Resolve token to a user (database lookup on the hash)
    let user = AuthToken::resolve_user(&pool, token)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("Database error: {}", e)))?
        .ok_or(AuthError::InvalidToken)?;

    let auth_context = AuthContext {
        user_id: user.id,
        email: user.email,
        fullname: user.fullname,
    };
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
