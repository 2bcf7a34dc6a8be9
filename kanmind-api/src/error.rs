/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which automatically converts
/// to the appropriate status code with a JSON body.
///
/// # Status Mapping
///
/// | Variant | Status |
/// |---|---|
/// | `BadRequest`, `Validation` | 400 |
/// | `Unauthorized` | 401 |
/// | `Forbidden` | 403 |
/// | `NotFound` | 404 |
/// | `Conflict` | 409 |
/// | `Internal` | 500 |
///
/// Validation failures are 400 rather than 422: malformed, missing, and
/// conflicting input all share the one client-error status the API
/// contract promises.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409)
    Conflict(String),

    /// Per-field validation errors (400)
    Validation(Vec<FieldError>),

    /// Internal server error (500)
    Internal(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional per-field validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Builds a `Validation` error from `validator` derive output
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::Validation(details)
    }

    /// Builds a single-field `Validation` error
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Internal(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Unique index violations surface as conflicts
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert auth middleware errors to API errors
impl From<kanmind_shared::auth::middleware::AuthError> for ApiError {
    fn from(err: kanmind_shared::auth::middleware::AuthError) -> Self {
        use kanmind_shared::auth::middleware::AuthError;
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken => ApiError::Unauthorized("Invalid token".to_string()),
            AuthError::DatabaseError(msg) => ApiError::Internal(msg),
        }
    }
}

/// Convert password errors to API errors
impl From<kanmind_shared::auth::password::PasswordError> for ApiError {
    fn from(err: kanmind_shared::auth::password::PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Convert policy errors to API errors
///
/// `Denied` maps to 403 by default; read paths that must hide existence
/// translate it to `NotFound` at the call site before this conversion runs.
impl From<kanmind_shared::auth::policy::PolicyError> for ApiError {
    fn from(err: kanmind_shared::auth::policy::PolicyError) -> Self {
        use kanmind_shared::auth::policy::PolicyError;
        match err {
            PolicyError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            PolicyError::Denied => {
                ApiError::Forbidden("You must be a board member to access this resource".to_string())
            }
            PolicyError::Database(e) => ApiError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Board not found".to_string());
        assert_eq!(err.to_string(), "Not found: Board not found");
    }

    #[test]
    fn test_validation_error_status() {
        let err = ApiError::field("email", "Invalid email format");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_policy_denied_maps_to_forbidden() {
        use kanmind_shared::auth::policy::PolicyError;

        let err = ApiError::from(PolicyError::Denied);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_policy_not_found_maps_to_404() {
        use kanmind_shared::auth::policy::PolicyError;

        let err = ApiError::from(PolicyError::NotFound);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
