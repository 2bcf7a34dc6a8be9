/// Task endpoints
///
/// This module provides task CRUD scoped to board membership, plus the two
/// filtered views.
///
/// # Endpoints
///
/// - `GET /api/tasks/` - List tasks on boards the requester can access
/// - `POST /api/tasks/` - Create a task (board member only)
/// - `GET /api/tasks/assigned_to_me/` - Paginated list, requester as assignee
/// - `GET /api/tasks/reviewing/` - Paginated list, requester as reviewer
/// - `GET /api/tasks/{task_id}/` - Retrieve a task
/// - `PUT/PATCH /api/tasks/{task_id}/` - Update a task (partial)
/// - `DELETE /api/tasks/{task_id}/` - Delete a task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use kanmind_shared::{
    auth::{middleware::AuthContext, policy},
    models::{
        board::Board,
        task::{CreateTask, Task, TaskPriority, TaskStatus, TaskView, UpdateTask},
        user::UserSummary,
    },
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Task response shape
///
/// Assignee and reviewer come expanded as user summaries; `comments_count`
/// is recomputed on every read.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    /// Task ID
    pub id: Uuid,

    /// Owning board ID
    pub board: Uuid,

    /// Task title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Assigned user, if any
    pub assignee: Option<UserSummary>,

    /// Reviewing user, if any
    pub reviewer: Option<UserSummary>,

    /// Optional deadline
    pub due_date: Option<NaiveDate>,

    /// Number of comments on this task
    pub comments_count: i64,
}

impl From<TaskView> for TaskResponse {
    fn from(view: TaskView) -> Self {
        let assignee = view.assignee();
        let reviewer = view.reviewer();
        Self {
            id: view.id,
            board: view.board_id,
            title: view.title,
            description: view.description,
            status: view.status,
            priority: view.priority,
            assignee,
            reviewer,
            due_date: view.due_date,
            comments_count: view.comments_count,
        }
    }
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Board the task belongs to
    pub board: Uuid,

    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Workflow status (defaults to to-do)
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority level (defaults to medium)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Optional assignee; must be a member of the board
    pub assignee_id: Option<Uuid>,

    /// Optional reviewer; must be a member of the board
    pub reviewer_id: Option<Uuid>,

    /// Optional deadline
    pub due_date: Option<NaiveDate>,
}

/// Update task request
///
/// Absent fields are left untouched; `assignee_id`, `reviewer_id`, and
/// `due_date` accept an explicit `null` to clear the value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// Present only to reject attempts to move a task between boards
    pub board: Option<Uuid>,

    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New assignee (null clears)
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    /// New reviewer (null clears)
    #[serde(default, deserialize_with = "double_option")]
    pub reviewer_id: Option<Option<Uuid>>,

    /// New deadline (null clears)
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

/// Distinguishes an absent field from an explicit null
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Pagination query parameters for the filtered views
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-based page number (default 1)
    pub page: Option<u32>,

    /// Page size (default 20, max 100)
    pub page_size: Option<u32>,
}

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

impl PageQuery {
    /// Resolves the query to (limit, offset, page, page_size)
    fn resolve(&self) -> (i64, i64, u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let limit = page_size as i64;
        let offset = (page as i64 - 1) * limit;
        (limit, offset, page, page_size)
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    /// Total number of matching rows
    pub count: i64,

    /// 1-based page number
    pub page: u32,

    /// Page size used
    pub page_size: u32,

    /// The page of results
    pub results: Vec<T>,
}

/// Validates that assignee/reviewer IDs belong to the board
///
/// Mirrors the membership predicate: the allowed set is the member rows
/// plus the owner.
async fn validate_task_users(
    state: &AppState,
    board_id: Uuid,
    assignee_id: Option<Uuid>,
    reviewer_id: Option<Uuid>,
) -> ApiResult<()> {
    if assignee_id.is_none() && reviewer_id.is_none() {
        return Ok(());
    }

    let member_ids = Board::member_ids(&state.db, board_id).await?;

    if let Some(id) = assignee_id {
        if !member_ids.contains(&id) {
            return Err(ApiError::field(
                "assignee_id",
                format!("User with ID {} is not a member of the board.", id),
            ));
        }
    }
    if let Some(id) = reviewer_id {
        if !member_ids.contains(&id) {
            return Err(ApiError::field(
                "reviewer_id",
                format!("User with ID {} is not a member of the board.", id),
            ));
        }
    }

    Ok(())
}

/// List tasks
///
/// Returns every task on boards the requester owns or is a member of.
///
/// # Endpoint
///
/// ```text
/// GET /api/tasks/
/// Authorization: Token <value>
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let views = Task::list_visible_to(&state.db, auth.user_id).await?;

    Ok(Json(views.into_iter().map(TaskResponse::from).collect()))
}

/// Create task
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks/
/// Authorization: Token <value>
/// Content-Type: application/json
///
/// {
///   "board": "uuid",
///   "title": "Wire up login",
///   "status": "to-do",
///   "priority": "high",
///   "assignee_id": "uuid"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: unknown board, or assignee/reviewer not a board member
/// - `403 Forbidden`: requester is not a member of the board
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate().map_err(ApiError::from_validation)?;

    match policy::check_board(&state.db, req.board, auth.user_id).await {
        Ok(()) => {}
        Err(policy::PolicyError::NotFound) => {
            return Err(ApiError::field("board", "Board not found."));
        }
        Err(e) => return Err(e.into()),
    }

    validate_task_users(&state, req.board, req.assignee_id, req.reviewer_id).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            board_id: req.board,
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            reviewer_id: req.reviewer_id,
            due_date: req.due_date,
        },
    )
    .await?;

    let view = Task::find_view(&state.db, task.id)
        .await?
        .ok_or_else(|| ApiError::Internal("Created task vanished".to_string()))?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(view))))
}

/// Retrieve task
///
/// # Endpoint
///
/// ```text
/// GET /api/tasks/{task_id}/
/// Authorization: Token <value>
/// ```
///
/// # Errors
///
/// - `404 Not Found`: task absent, or the requester cannot access its board
///   (existence is not revealed)
pub async fn retrieve_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    policy::check_task(&state.db, task_id, auth.user_id)
        .await
        .map_err(hide_denied)?;

    let view = Task::find_view(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse::from(view)))
}

/// Update task
///
/// PUT and PATCH both apply a partial update; the board is immutable.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/tasks/{task_id}/
/// Authorization: Token <value>
/// Content-Type: application/json
///
/// { "status": "done", "assignee_id": null }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: board change attempted, or assignee/reviewer not a
///   board member
/// - `403 Forbidden`: requester is not a member of the task's board
/// - `404 Not Found`: task absent
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    if req.board.is_some() {
        return Err(ApiError::field("board", "The board of a task cannot be changed."));
    }

    let task_board = policy::check_task(&state.db, task_id, auth.user_id).await?;

    validate_task_users(
        &state,
        task_board.board_id,
        req.assignee_id.flatten(),
        req.reviewer_id.flatten(),
    )
    .await?;

    Task::update(
        &state.db,
        task_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            reviewer_id: req.reviewer_id,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let view = Task::find_view(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse::from(view)))
}

/// Delete task
///
/// # Endpoint
///
/// ```text
/// DELETE /api/tasks/{task_id}/
/// Authorization: Token <value>
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: requester is not a member of the task's board
/// - `404 Not Found`: task absent
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    policy::check_task(&state.db, task_id, auth.user_id).await?;

    Task::delete(&state.db, task_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Tasks assigned to the requester
///
/// # Endpoint
///
/// ```text
/// GET /api/tasks/assigned_to_me/?page=1&page_size=20
/// Authorization: Token <value>
/// ```
pub async fn assigned_to_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<TaskResponse>>> {
    let (limit, offset, page, page_size) = query.resolve();

    let count = Task::count_assigned_to(&state.db, auth.user_id).await?;
    let views = Task::list_assigned_to(&state.db, auth.user_id, limit, offset).await?;

    Ok(Json(Paginated {
        count,
        page,
        page_size,
        results: views.into_iter().map(TaskResponse::from).collect(),
    }))
}

/// Tasks the requester is reviewing
///
/// # Endpoint
///
/// ```text
/// GET /api/tasks/reviewing/?page=1&page_size=20
/// Authorization: Token <value>
/// ```
pub async fn reviewing(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<TaskResponse>>> {
    let (limit, offset, page, page_size) = query.resolve();

    let count = Task::count_reviewed_by(&state.db, auth.user_id).await?;
    let views = Task::list_reviewed_by(&state.db, auth.user_id, limit, offset).await?;

    Ok(Json(Paginated {
        count,
        page,
        page_size,
        results: views.into_iter().map(TaskResponse::from).collect(),
    }))
}

/// Read-path policy mapping: a denied task read is indistinguishable from
/// an absent task.
fn hide_denied(err: policy::PolicyError) -> ApiError {
    match err {
        policy::PolicyError::Denied => ApiError::NotFound("Task not found".to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults() {
        let query = PageQuery {
            page: None,
            page_size: None,
        };
        let (limit, offset, page, page_size) = query.resolve();
        assert_eq!(limit, 20);
        assert_eq!(offset, 0);
        assert_eq!(page, 1);
        assert_eq!(page_size, 20);
    }

    #[test]
    fn test_page_query_clamps_size() {
        let query = PageQuery {
            page: Some(3),
            page_size: Some(500),
        };
        let (limit, offset, _, page_size) = query.resolve();
        assert_eq!(limit, 100);
        assert_eq!(offset, 200);
        assert_eq!(page_size, 100);
    }

    #[test]
    fn test_page_query_zero_page_is_first() {
        let query = PageQuery {
            page: Some(0),
            page_size: Some(10),
        };
        let (_, offset, page, _) = query.resolve();
        assert_eq!(page, 1);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_update_request_absent_vs_null() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert!(absent.assignee_id.is_none());

        let cleared: UpdateTaskRequest =
            serde_json::from_str(r#"{"assignee_id": null}"#).unwrap();
        assert_eq!(cleared.assignee_id, Some(None));

        let set: UpdateTaskRequest = serde_json::from_str(
            r#"{"assignee_id": "00000000-0000-0000-0000-000000000001"}"#,
        )
        .unwrap();
        assert!(matches!(set.assignee_id, Some(Some(_))));
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateTaskRequest = serde_json::from_str(
            r#"{"board": "00000000-0000-0000-0000-000000000001", "title": "t"}"#,
        )
        .unwrap();
        assert_eq!(req.status, TaskStatus::ToDo);
        assert_eq!(req.priority, TaskPriority::Medium);
        assert_eq!(req.description, "");
    }
}
