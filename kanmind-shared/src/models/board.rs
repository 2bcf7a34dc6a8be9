/// Board model and database operations
///
/// This module provides the Board model, the board membership relation, and
/// the aggregated board summary. A board has exactly one owner and a member
/// set; the owner always holds a membership row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE board_members (
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (board_id, user_id)
/// );
/// ```
///
/// # Aggregates
///
/// `member_count`, `ticket_count`, `tasks_to_do_count`, and
/// `tasks_high_prio_count` are computed fresh on every read via correlated
/// subqueries; they are never stored.
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::board::{Board, CreateBoard};
/// use kanmind_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let owner_id = Uuid::new_v4();
///
/// let board = Board::create(&pool, CreateBoard {
///     title: "Sprint 1".to_string(),
///     owner_id,
///     member_ids: vec![],
/// }).await?;
///
/// let summaries = Board::list_summaries_for_user(&pool, owner_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;

/// Board model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    /// Unique board ID
    pub id: Uuid,

    /// Board title
    pub title: String,

    /// User who created and owns the board
    pub owner_id: Uuid,

    /// When the board was created
    pub created_at: DateTime<Utc>,

    /// When the board was last updated
    pub updated_at: DateTime<Utc>,
}

/// Board summary with read-time aggregates
///
/// This is the shape returned by board list/create endpoints. All four
/// counts come from correlated subqueries over the membership and task
/// tables.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BoardSummary {
    /// Board ID
    pub id: Uuid,

    /// Board title
    pub title: String,

    /// Owner user ID
    pub owner_id: Uuid,

    /// Number of members (the owner is always one of them)
    pub member_count: i64,

    /// Total number of tasks on the board
    pub ticket_count: i64,

    /// Number of tasks with status "to-do"
    pub tasks_to_do_count: i64,

    /// Number of tasks with priority "high"
    pub tasks_high_prio_count: i64,
}

/// Input for creating a new board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBoard {
    /// Board title
    pub title: String,

    /// Owner user ID (becomes a member as well)
    pub owner_id: Uuid,

    /// Additional member IDs (validated against the users table by the caller)
    pub member_ids: Vec<Uuid>,
}

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.title, b.owner_id,
           (SELECT COUNT(*) FROM board_members m WHERE m.board_id = b.id) AS member_count,
           (SELECT COUNT(*) FROM tasks t WHERE t.board_id = b.id) AS ticket_count,
           (SELECT COUNT(*) FROM tasks t
             WHERE t.board_id = b.id AND t.status = 'to-do') AS tasks_to_do_count,
           (SELECT COUNT(*) FROM tasks t
             WHERE t.board_id = b.id AND t.priority = 'high') AS tasks_high_prio_count
    FROM boards b
"#;

impl Board {
    /// Creates a new board with its owner and initial member set
    ///
    /// Runs in a transaction: the board row, the owner's membership, and
    /// every additional membership commit together, so the owner-is-member
    /// invariant holds from the first visible state.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A member ID violates the users foreign key
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateBoard) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (title, owner_id)
            VALUES ($1, $2)
            RETURNING id, title, owner_id, created_at, updated_at
            "#,
        )
        .bind(&data.title)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        // Owner first, then the rest; ON CONFLICT keeps a duplicate of the
        // owner in member_ids from failing the insert.
        let mut members = vec![data.owner_id];
        members.extend(data.member_ids.iter().copied());

        sqlx::query(
            r#"
            INSERT INTO board_members (board_id, user_id)
            SELECT $1::uuid, user_id FROM UNNEST($2::uuid[]) AS user_id
            ON CONFLICT (board_id, user_id) DO NOTHING
            "#,
        )
        .bind(board.id)
        .bind(members)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(board)
    }

    /// Finds a board by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            SELECT id, title, owner_id, created_at, updated_at
            FROM boards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(board)
    }

    /// Lists board summaries visible to a user
    ///
    /// A board is visible when the user is its owner or holds a membership
    /// row. Ordered by ID for a stable listing.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn list_summaries_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<BoardSummary>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT}
            WHERE b.owner_id = $1
               OR EXISTS (SELECT 1 FROM board_members m
                           WHERE m.board_id = b.id AND m.user_id = $1)
            ORDER BY b.id"
        );

        let summaries = sqlx::query_as::<_, BoardSummary>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(summaries)
    }

    /// Fetches the aggregated summary of a single board
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn find_summary(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<BoardSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE b.id = $1");

        let summary = sqlx::query_as::<_, BoardSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(summary)
    }

    /// Checks if a user is the owner or a member of a board
    ///
    /// This is the raw lookup behind the centralized access policy; route
    /// code goes through `auth::policy` instead of calling this directly.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn is_owner_or_member(
        pool: &PgPool,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let has_access: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM boards b
                WHERE b.id = $1
                  AND (b.owner_id = $2
                       OR EXISTS (SELECT 1 FROM board_members m
                                   WHERE m.board_id = b.id AND m.user_id = $2))
            )
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(has_access)
    }

    /// Lists the members of a board as user summaries
    ///
    /// Ordered by membership creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn list_members(
        pool: &PgPool,
        board_id: Uuid,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        let members = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.email, u.fullname
            FROM board_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.board_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Returns the IDs of everyone allowed on the board (members plus owner)
    ///
    /// Used to validate task assignee/reviewer IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn member_ids(pool: &PgPool, board_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT user_id FROM board_members WHERE board_id = $1
            UNION
            SELECT owner_id FROM boards WHERE id = $1
            "#,
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// Updates a board's title
    ///
    /// # Returns
    ///
    /// The updated board if found, None if the board doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn update_title(
        pool: &PgPool,
        id: Uuid,
        title: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET title = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .fetch_optional(pool)
        .await?;

        Ok(board)
    }

    /// Replaces the member set of a board
    ///
    /// The owner is always re-added regardless of the given list, so a
    /// membership update can never violate the owner-is-member invariant.
    /// Runs in a transaction so readers never observe an empty member set.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A member ID violates the users foreign key
    /// - Database connection fails
    pub async fn replace_members(
        pool: &PgPool,
        board_id: Uuid,
        owner_id: Uuid,
        member_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM board_members WHERE board_id = $1")
            .bind(board_id)
            .execute(&mut *tx)
            .await?;

        let mut members = vec![owner_id];
        members.extend(member_ids.iter().copied());

        sqlx::query(
            r#"
            INSERT INTO board_members (board_id, user_id)
            SELECT $1::uuid, user_id FROM UNNEST($2::uuid[]) AS user_id
            ON CONFLICT (board_id, user_id) DO NOTHING
            "#,
        )
        .bind(board_id)
        .bind(members)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Deletes a board
    ///
    /// Tasks, comments, and memberships go with it via `ON DELETE CASCADE`.
    ///
    /// # Returns
    ///
    /// True if the board was deleted, false if it didn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_select_names_every_count() {
        for column in [
            "member_count",
            "ticket_count",
            "tasks_to_do_count",
            "tasks_high_prio_count",
        ] {
            assert!(SUMMARY_SELECT.contains(column), "missing {column}");
        }
    }

    #[test]
    fn test_create_board_input() {
        let owner_id = Uuid::new_v4();
        let data = CreateBoard {
            title: "Sprint 1".to_string(),
            owner_id,
            member_ids: vec![Uuid::new_v4()],
        };

        assert_eq!(data.title, "Sprint 1");
        assert_eq!(data.member_ids.len(), 1);
    }

    // Integration tests for database operations are in tests/model_tests.rs
}
