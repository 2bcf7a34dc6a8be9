/// Authentication endpoints
///
/// This module provides the public identity endpoints:
/// - Registration
/// - Login
/// - Email lookup (used by clients before inviting a board member)
///
/// # Endpoints
///
/// - `POST /api/registration/` - Register new user
/// - `POST /api/login/` - Login and get a token
/// - `GET /api/email-check/?email=` - Look up a user by email

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Json,
};
use kanmind_shared::{
    auth::password,
    models::{
        auth_token::AuthToken,
        user::{CreateUser, User, UserSummary},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Fullname must be 1-255 characters"))]
    pub fullname: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Password confirmation; must match `password`
    pub repeated_password: String,

    /// Optional profile bio
    pub bio: Option<String>,

    /// Optional profile location
    pub location: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Response shape shared by registration and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The opaque bearer token; send as `Authorization: Token <value>`
    pub token: String,

    /// User's display name
    pub fullname: String,

    /// User's email
    pub email: String,

    /// User ID
    pub user_id: Uuid,
}

/// Email check query parameters
#[derive(Debug, Deserialize)]
pub struct EmailCheckQuery {
    /// Email to look up
    pub email: Option<String>,
}

/// Register a new user
///
/// Creates the account and issues its first token in one transaction.
///
/// # Endpoint
///
/// ```text
/// POST /api/registration/
/// Content-Type: application/json
///
/// {
///   "fullname": "John Doe",
///   "email": "user@example.com",
///   "password": "secret-password",
///   "repeated_password": "secret-password"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: malformed fields, mismatched passwords, or a taken
///   email
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    if req.password != req.repeated_password {
        return Err(ApiError::field("repeated_password", "Passwords don't match."));
    }

    if User::email_exists(&state.db, &req.email).await? {
        return Err(ApiError::field("email", "This email address already exists."));
    }

    let password_hash = password::hash_password(&req.password)?;

    // User row and first token commit together
    let mut tx = state.db.begin().await?;

    let user = User::create_in_tx(
        &mut tx,
        CreateUser {
            email: req.email,
            password_hash,
            fullname: req.fullname,
            bio: req.bio,
            location: req.location,
        },
    )
    .await?;

    let (_, token) = AuthToken::issue_in_tx(&mut tx, user.id).await?;

    tx.commit().await?;

    Ok(Json(AuthResponse {
        token,
        fullname: user.fullname,
        email: user.email,
        user_id: user.id,
    }))
}

/// Login endpoint
///
/// Authenticates a user by email and password and issues a fresh token.
/// Previously issued tokens stay valid.
///
/// # Endpoint
///
/// ```text
/// POST /api/login/
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "secret-password"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: unknown email or wrong password (the message does
///   not reveal which)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid email or password.".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::BadRequest("Invalid email or password.".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let (_, token) = AuthToken::issue(&state.db, user.id).await?;

    Ok(Json(AuthResponse {
        token,
        fullname: user.fullname,
        email: user.email,
        user_id: user.id,
    }))
}

/// Email lookup endpoint
///
/// Read-only check used by clients to resolve an email to a user before
/// inviting them as a board member.
///
/// # Endpoint
///
/// ```text
/// GET /api/email-check/?email=user@example.com
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing `email` query parameter
/// - `404 Not Found`: no user with that email
pub async fn email_check(
    State(state): State<AppState>,
    Query(query): Query<EmailCheckQuery>,
) -> ApiResult<Json<UserSummary>> {
    let email = query
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email parameter is required.".to_string()))?;

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User with this email not found.".to_string()))?;

    Ok(Json(UserSummary::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            fullname: "John Doe".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            repeated_password: "short".to_string(),
            bio: None,
            location: None,
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_register_request_valid() {
        let req = RegisterRequest {
            fullname: "John Doe".to_string(),
            email: "user@example.com".to_string(),
            password: "secret-password".to_string(),
            repeated_password: "secret-password".to_string(),
            bio: None,
            location: None,
        };

        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_login_request_requires_email_shape() {
        let req = LoginRequest {
            email: "nope".to_string(),
            password: "whatever".to_string(),
        };

        assert!(req.validate().is_err());
    }
}
