/// Task model and database operations
///
/// This module provides the Task model. Tasks belong to exactly one board,
/// carry a status and priority, and optionally an assignee, a reviewer, and
/// a due date. Reads go through `TaskView`, which expands assignee/reviewer
/// into user summaries and annotates each row with its comment count.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('to-do', 'in-progress', 'review', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'to-do',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     reviewer_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     due_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::task::{Task, CreateTask, TaskStatus, TaskPriority};
/// use kanmind_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     board_id: Uuid::new_v4(),
///     title: "Wire up login".to_string(),
///     description: "".to_string(),
///     status: TaskStatus::ToDo,
///     priority: TaskPriority::High,
///     assignee_id: None,
///     reviewer_id: None,
///     due_date: None,
/// }).await?;
///
/// let view = Task::find_view(&pool, task.id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started
    ToDo,

    /// Being worked on
    InProgress,

    /// Waiting for review
    Review,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Converts status to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to-do",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::ToDo
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority
    Low,

    /// Medium priority
    Medium,

    /// High priority
    High,
}

impl TaskPriority {
    /// Converts priority to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Task row as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Board this task belongs to (immutable after creation)
    pub board_id: Uuid,

    /// Task title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Assigned user (must be a board member when set)
    pub assignee_id: Option<Uuid>,

    /// Reviewing user (must be a board member when set)
    pub reviewer_id: Option<Uuid>,

    /// Optional deadline
    pub due_date: Option<NaiveDate>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Annotated task read shape
///
/// Every list/retrieve path uses this: assignee and reviewer come expanded
/// via LEFT JOINs and `comments_count` is a correlated subquery, so the
/// count can never drift from the comment rows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskView {
    /// Task ID
    pub id: Uuid,

    /// Board this task belongs to
    pub board_id: Uuid,

    /// Task title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Assignee ID, if set
    pub assignee_id: Option<Uuid>,

    /// Assignee email (from the joined user row)
    pub assignee_email: Option<String>,

    /// Assignee fullname (from the joined user row)
    pub assignee_fullname: Option<String>,

    /// Reviewer ID, if set
    pub reviewer_id: Option<Uuid>,

    /// Reviewer email (from the joined user row)
    pub reviewer_email: Option<String>,

    /// Reviewer fullname (from the joined user row)
    pub reviewer_fullname: Option<String>,

    /// Optional deadline
    pub due_date: Option<NaiveDate>,

    /// Number of comments on this task
    pub comments_count: i64,
}

impl TaskView {
    /// Assignee as a user summary, if one is set
    pub fn assignee(&self) -> Option<UserSummary> {
        match (self.assignee_id, &self.assignee_email, &self.assignee_fullname) {
            (Some(id), Some(email), Some(fullname)) => Some(UserSummary {
                id,
                email: email.clone(),
                fullname: fullname.clone(),
            }),
            _ => None,
        }
    }

    /// Reviewer as a user summary, if one is set
    pub fn reviewer(&self) -> Option<UserSummary> {
        match (self.reviewer_id, &self.reviewer_email, &self.reviewer_fullname) {
            (Some(id), Some(email), Some(fullname)) => Some(UserSummary {
                id,
                email: email.clone(),
                fullname: fullname.clone(),
            }),
            _ => None,
        }
    }
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Board ID
    pub board_id: Uuid,

    /// Task title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Workflow status (defaults to to-do)
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority level (defaults to medium)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Optional assignee (must be a board member)
    pub assignee_id: Option<Uuid>,

    /// Optional reviewer (must be a board member)
    pub reviewer_id: Option<Uuid>,

    /// Optional deadline
    pub due_date: Option<NaiveDate>,
}

/// Input for updating a task
///
/// All fields are optional. The outer Option is "was the field present";
/// for assignee/reviewer/due_date the inner Option distinguishes setting a
/// value from clearing it with an explicit null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New assignee (Some(None) clears)
    pub assignee_id: Option<Option<Uuid>>,

    /// New reviewer (Some(None) clears)
    pub reviewer_id: Option<Option<Uuid>>,

    /// New deadline (Some(None) clears)
    pub due_date: Option<Option<NaiveDate>>,
}

const VIEW_SELECT: &str = r#"
    SELECT t.id, t.board_id, t.title, t.description, t.status, t.priority,
           t.assignee_id, a.email AS assignee_email, a.fullname AS assignee_fullname,
           t.reviewer_id, r.email AS reviewer_email, r.fullname AS reviewer_fullname,
           t.due_date,
           (SELECT COUNT(*) FROM comments c WHERE c.task_id = t.id) AS comments_count
    FROM tasks t
    LEFT JOIN users a ON a.id = t.assignee_id
    LEFT JOIN users r ON r.id = t.reviewer_id
"#;

impl Task {
    /// Creates a new task
    ///
    /// Assignee/reviewer board-membership validation happens in the route
    /// layer before this is called; the schema only enforces that the users
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The board doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (board_id, title, description, status, priority,
                               assignee_id, reviewer_id, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, board_id, title, description, status, priority,
                      assignee_id, reviewer_id, due_date, created_at, updated_at
            "#,
        )
        .bind(data.board_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.assignee_id)
        .bind(data.reviewer_id)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, board_id, title, description, status, priority,
                   assignee_id, reviewer_id, due_date, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Fetches the annotated view of a single task
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn find_view(pool: &PgPool, id: Uuid) -> Result<Option<TaskView>, sqlx::Error> {
        let query = format!("{VIEW_SELECT} WHERE t.id = $1");

        let view = sqlx::query_as::<_, TaskView>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(view)
    }

    /// Lists every task on boards the user can access
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn list_visible_to(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<TaskView>, sqlx::Error> {
        let query = format!(
            "{VIEW_SELECT}
            JOIN boards b ON b.id = t.board_id
            WHERE b.owner_id = $1
               OR EXISTS (SELECT 1 FROM board_members m
                           WHERE m.board_id = b.id AND m.user_id = $1)
            ORDER BY t.id"
        );

        let views = sqlx::query_as::<_, TaskView>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(views)
    }

    /// Lists the tasks of one board, for the board detail view
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn list_for_board(
        pool: &PgPool,
        board_id: Uuid,
    ) -> Result<Vec<TaskView>, sqlx::Error> {
        let query = format!("{VIEW_SELECT} WHERE t.board_id = $1 ORDER BY t.id");

        let views = sqlx::query_as::<_, TaskView>(&query)
            .bind(board_id)
            .fetch_all(pool)
            .await?;

        Ok(views)
    }

    /// Lists tasks assigned to a user, paginated
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn list_assigned_to(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskView>, sqlx::Error> {
        let query = format!(
            "{VIEW_SELECT} WHERE t.assignee_id = $1 ORDER BY t.id LIMIT $2 OFFSET $3"
        );

        let views = sqlx::query_as::<_, TaskView>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(views)
    }

    /// Counts tasks assigned to a user
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn count_assigned_to(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE assignee_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Lists tasks a user is reviewing, paginated
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn list_reviewed_by(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskView>, sqlx::Error> {
        let query = format!(
            "{VIEW_SELECT} WHERE t.reviewer_id = $1 ORDER BY t.id LIMIT $2 OFFSET $3"
        );

        let views = sqlx::query_as::<_, TaskView>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(views)
    }

    /// Counts tasks a user is reviewing
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn count_reviewed_by(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE reviewer_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Updates a task
    ///
    /// Only fields present in `data` are touched; `updated_at` is stamped.
    /// The board cannot be changed through this path.
    ///
    /// # Returns
    ///
    /// The updated task if found, None if the task doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee_id = ${}", bind_count));
        }
        if data.reviewer_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", reviewer_id = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, board_id, title, description, status, priority, \
             assignee_id, reviewer_id, due_date, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(assignee_opt) = data.assignee_id {
            q = q.bind(assignee_opt);
        }
        if let Some(reviewer_opt) = data.reviewer_id {
            q = q.bind(reviewer_opt);
        }
        if let Some(due_date_opt) = data.due_date {
            q = q.bind(due_date_opt);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Comments go with it via `ON DELETE CASCADE`.
    ///
    /// # Returns
    ///
    /// True if the task was deleted, false if it didn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
