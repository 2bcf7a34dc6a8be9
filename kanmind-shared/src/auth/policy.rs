/// Centralized board-access policy
///
/// One predicate governs every board, task, and comment operation: the
/// requester must be the board's owner or one of its members. Task and
/// comment paths resolve the owning board transitively before the same
/// check runs. Keeping the predicate here, instead of inlined per route,
/// is what stops the policy from drifting between services.
///
/// Route handlers decide how a denial surfaces: write paths map
/// `PolicyError::Denied` to 403, read paths that must not leak existence
/// map it to 404.
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::auth::policy;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, board_id: Uuid, user_id: Uuid)
/// #     -> Result<(), kanmind_shared::auth::policy::PolicyError> {
/// policy::check_board(&pool, board_id, user_id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::board::Board;
use crate::models::task::Task;

/// Error type for access policy checks
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The resource (board, task, or comment) doesn't exist
    #[error("Resource not found")]
    NotFound,

    /// The requester is neither owner nor member of the owning board
    #[error("Not a member of this board")]
    Denied,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The board a task resolved to during a transitive check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskBoard {
    /// The owning board's ID
    pub board_id: Uuid,
}

/// Checks that a user may access a board
///
/// # Errors
///
/// - `PolicyError::NotFound` when the board doesn't exist
/// - `PolicyError::Denied` when the user is neither owner nor member
pub async fn check_board(
    pool: &PgPool,
    board_id: Uuid,
    user_id: Uuid,
) -> Result<(), PolicyError> {
    if Board::find_by_id(pool, board_id).await?.is_none() {
        return Err(PolicyError::NotFound);
    }

    if !Board::is_owner_or_member(pool, board_id, user_id).await? {
        return Err(PolicyError::Denied);
    }

    Ok(())
}

/// Checks that a user may access a task, via its owning board
///
/// Resolves Task → Board, then applies the same predicate as
/// [`check_board`]. Comment operations reuse this with the comment's task.
///
/// # Returns
///
/// The owning board's ID, for callers that go on to validate member lists
///
/// # Errors
///
/// - `PolicyError::NotFound` when the task doesn't exist
/// - `PolicyError::Denied` when the user is neither owner nor member
pub async fn check_task(
    pool: &PgPool,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<TaskBoard, PolicyError> {
    let task = Task::find_by_id(pool, task_id)
        .await?
        .ok_or(PolicyError::NotFound)?;

    if !Board::is_owner_or_member(pool, task.board_id, user_id).await? {
        return Err(PolicyError::Denied);
    }

    Ok(TaskBoard {
        board_id: task.board_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_error_display() {
        assert_eq!(PolicyError::NotFound.to_string(), "Resource not found");
        assert_eq!(PolicyError::Denied.to_string(), "Not a member of this board");
    }

    // The predicate itself needs a database; covered in tests/model_tests.rs
}
