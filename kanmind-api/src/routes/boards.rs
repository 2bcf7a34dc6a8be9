/// Board endpoints
///
/// This module provides board CRUD. List/create respond with the
/// aggregated summary shape; retrieve/update respond with the detail shape
/// carrying the expanded member list and the nested task list.
///
/// # Endpoints
///
/// - `GET /api/boards/` - List boards the requester can access
/// - `POST /api/boards/` - Create a board (requester becomes owner + member)
/// - `GET /api/boards/{board_id}/` - Retrieve board detail
/// - `PUT/PATCH /api/boards/{board_id}/` - Update title and/or membership
/// - `DELETE /api/boards/{board_id}/` - Delete a board

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::tasks::TaskResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use kanmind_shared::{
    auth::{middleware::AuthContext, policy},
    models::{
        board::{Board, BoardSummary, CreateBoard},
        task::Task,
        user::{User, UserSummary},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create board request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    /// Board title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Initial member IDs; the requester is added regardless
    #[serde(default)]
    pub members: Vec<Uuid>,
}

/// Update board request (PUT and PATCH, both partial)
///
/// Only title and membership are mutable.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBoardRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    /// Replacement member IDs; the owner is kept regardless
    pub members: Option<Vec<Uuid>>,
}

/// Board detail response
#[derive(Debug, Serialize)]
pub struct BoardDetail {
    /// Board ID
    pub id: Uuid,

    /// Board title
    pub title: String,

    /// Owner user ID
    pub owner_id: Uuid,

    /// Expanded member list (the owner is always present)
    pub members: Vec<UserSummary>,

    /// The board's tasks
    pub tasks: Vec<TaskResponse>,
}

/// Rejects member lists that reference unknown users
async fn validate_member_ids(state: &AppState, member_ids: &[Uuid]) -> ApiResult<()> {
    let missing = User::missing_ids(&state.db, member_ids).await?;
    if let Some(id) = missing.first() {
        return Err(ApiError::field(
            "members",
            format!("User with ID {} does not exist.", id),
        ));
    }
    Ok(())
}

/// Builds the detail response for a board the requester may access
async fn board_detail(state: &AppState, board: Board) -> ApiResult<BoardDetail> {
    let members = Board::list_members(&state.db, board.id).await?;
    let tasks = Task::list_for_board(&state.db, board.id).await?;

    Ok(BoardDetail {
        id: board.id,
        title: board.title,
        owner_id: board.owner_id,
        members,
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
    })
}

/// List boards
///
/// Returns the boards the requester owns or is a member of, each with the
/// four aggregated counts.
///
/// # Endpoint
///
/// ```text
/// GET /api/boards/
/// Authorization: Token <value>
/// ```
///
/// # Response
///
/// ```json
/// [
///   {
///     "id": "uuid",
///     "title": "Sprint 1",
///     "owner_id": "uuid",
///     "member_count": 2,
///     "ticket_count": 1,
///     "tasks_to_do_count": 1,
///     "tasks_high_prio_count": 1
///   }
/// ]
/// ```
pub async fn list_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<BoardSummary>>> {
    let summaries = Board::list_summaries_for_user(&state.db, auth.user_id).await?;

    Ok(Json(summaries))
}

/// Create board
///
/// The requester becomes owner and member; every given member ID is added
/// on top. Unknown member IDs are rejected.
///
/// # Endpoint
///
/// ```text
/// POST /api/boards/
/// Authorization: Token <value>
/// Content-Type: application/json
///
/// {
///   "title": "Sprint 1",
///   "members": ["uuid"]
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: empty title or unknown member IDs
pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<BoardSummary>)> {
    req.validate().map_err(ApiError::from_validation)?;

    validate_member_ids(&state, &req.members).await?;

    let board = Board::create(
        &state.db,
        CreateBoard {
            title: req.title,
            owner_id: auth.user_id,
            member_ids: req.members,
        },
    )
    .await?;

    let summary = Board::find_summary(&state.db, board.id)
        .await?
        .ok_or_else(|| ApiError::Internal("Created board vanished".to_string()))?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// Retrieve board detail
///
/// # Endpoint
///
/// ```text
/// GET /api/boards/{board_id}/
/// Authorization: Token <value>
/// ```
///
/// # Errors
///
/// - `404 Not Found`: board absent, or the requester is not owner/member
///   (existence is not revealed to non-members)
pub async fn retrieve_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<BoardDetail>> {
    policy::check_board(&state.db, board_id, auth.user_id)
        .await
        .map_err(hide_denied)?;

    let board = Board::find_by_id(&state.db, board_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))?;

    Ok(Json(board_detail(&state, board).await?))
}

/// Update board
///
/// PUT and PATCH both apply a partial update of title and/or membership.
/// A membership update replaces the member set with the given IDs plus the
/// owner.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/boards/{board_id}/
/// Authorization: Token <value>
/// Content-Type: application/json
///
/// { "title": "Sprint 2", "members": ["uuid"] }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: empty title or unknown member IDs
/// - `403 Forbidden`: requester is not owner/member
/// - `404 Not Found`: board absent
pub async fn update_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
    Json(req): Json<UpdateBoardRequest>,
) -> ApiResult<Json<BoardDetail>> {
    req.validate().map_err(ApiError::from_validation)?;

    policy::check_board(&state.db, board_id, auth.user_id).await?;

    let mut board = Board::find_by_id(&state.db, board_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))?;

    if let Some(title) = &req.title {
        board = Board::update_title(&state.db, board_id, title)
            .await?
            .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))?;
    }

    if let Some(members) = &req.members {
        validate_member_ids(&state, members).await?;
        Board::replace_members(&state.db, board_id, board.owner_id, members).await?;
    }

    Ok(Json(board_detail(&state, board).await?))
}

/// Delete board
///
/// The gate is owner *or* member, not owner-only. Tasks and comments
/// cascade.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/boards/{board_id}/
/// Authorization: Token <value>
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: requester is not owner/member
/// - `404 Not Found`: board absent
pub async fn delete_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    policy::check_board(&state.db, board_id, auth.user_id).await?;

    Board::delete(&state.db, board_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Read-path policy mapping: a denied board read is indistinguishable from
/// an absent board.
fn hide_denied(err: policy::PolicyError) -> ApiError {
    match err {
        policy::PolicyError::Denied => ApiError::NotFound("Board not found".to_string()),
        other => other.into(),
    }
}
