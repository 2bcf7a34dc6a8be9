/// Comment endpoints
///
/// Comments are nested under tasks. Listing and creating are gated on
/// membership of the task's board; deletion is author-only.
///
/// # Endpoints
///
/// - `GET /api/tasks/{task_id}/comments/` - List comments, oldest first
/// - `POST /api/tasks/{task_id}/comments/` - Create a comment
/// - `DELETE /api/tasks/{task_id}/comments/{comment_id}/` - Delete own comment

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use kanmind_shared::{
    auth::{middleware::AuthContext, policy},
    models::comment::{Comment, CommentView, CreateComment},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// Comment text
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
}

/// List comments
///
/// # Endpoint
///
/// ```text
/// GET /api/tasks/{task_id}/comments/
/// Authorization: Token <value>
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: requester is not a member of the task's board
/// - `404 Not Found`: task absent
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentView>>> {
    policy::check_task(&state.db, task_id, auth.user_id).await?;

    let comments = Comment::list_for_task(&state.db, task_id).await?;

    Ok(Json(comments))
}

/// Create comment
///
/// The author is always the requester; `created_at` is server-assigned.
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks/{task_id}/comments/
/// Authorization: Token <value>
/// Content-Type: application/json
///
/// { "content": "Looks good" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "id": "uuid",
///   "created_at": "2025-03-01T12:00:00Z",
///   "author": "John Doe",
///   "content": "Looks good"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: empty content
/// - `403 Forbidden`: requester is not a member of the task's board
/// - `404 Not Found`: task absent
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    req.validate().map_err(ApiError::from_validation)?;

    policy::check_task(&state.db, task_id, auth.user_id).await?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id,
            author_id: auth.user_id,
            content: req.content,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentView {
            id: comment.id,
            created_at: comment.created_at,
            author: auth.fullname,
            content: comment.content,
        }),
    ))
}

/// Delete comment
///
/// Only the author may delete a comment; board membership alone is not
/// enough.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/tasks/{task_id}/comments/{comment_id}/
/// Authorization: Token <value>
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: requester is a board member but not the author
/// - `404 Not Found`: task absent, comment absent, or comment belongs to a
///   different task
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    policy::check_task(&state.db, task_id, auth.user_id).await?;

    let comment = Comment::find_in_task(&state.db, task_id, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Only the author can delete a comment".to_string(),
        ));
    }

    Comment::delete(&state.db, comment_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_comment_request_rejects_empty_content() {
        let req = CreateCommentRequest {
            content: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_comment_request_accepts_content() {
        let req: CreateCommentRequest =
            serde_json::from_str(r#"{"content": "Looks good"}"#).unwrap();
        assert!(req.validate().is_ok());
    }
}
