/// Comment model and database operations
///
/// This module provides the Comment model. Comments hang off a task, carry
/// the requester as immutable author, and list ascending by creation time.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::comment::{Comment, CreateComment};
/// use kanmind_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let comment = Comment::create(&pool, CreateComment {
///     task_id: Uuid::new_v4(),
///     author_id: Uuid::new_v4(),
///     content: "Looks good".to_string(),
/// }).await?;
///
/// let all = Comment::list_for_task(&pool, comment.task_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Comment row as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,

    /// Task this comment belongs to
    pub task_id: Uuid,

    /// Author (the requester at creation time, immutable)
    pub author_id: Uuid,

    /// Comment text
    pub content: String,

    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
}

/// Comment read shape with the author's fullname joined in
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentView {
    /// Comment ID
    pub id: Uuid,

    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,

    /// Author's fullname
    pub author: String,

    /// Comment text
    pub content: String,
}

/// Input for creating a new comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    /// Task ID
    pub task_id: Uuid,

    /// Author user ID
    pub author_id: Uuid,

    /// Comment text
    pub content: String,
}

impl Comment {
    /// Creates a new comment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The task or author doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, author_id, content, created_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.author_id)
        .bind(data.content)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Finds a comment by ID, scoped to its task
    ///
    /// Returns None when the comment doesn't exist or belongs to another
    /// task, so a mismatched task/comment pair reads as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn find_in_task(
        pool: &PgPool,
        task_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, content, created_at
            FROM comments
            WHERE id = $1 AND task_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Lists the comments of a task, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<CommentView>, sqlx::Error> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.created_at, u.fullname AS author, c.content
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.task_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    /// Fetches the read shape of a single comment
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn find_view(pool: &PgPool, id: Uuid) -> Result<Option<CommentView>, sqlx::Error> {
        let view = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.created_at, u.fullname AS author, c.content
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(view)
    }

    /// Counts the comments on a task
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn count_for_task(pool: &PgPool, task_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM comments WHERE task_id = $1")
                .bind(task_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Deletes a comment
    ///
    /// Author-only enforcement happens in the route layer; this removes the
    /// row unconditionally.
    ///
    /// # Returns
    ///
    /// True if the comment was deleted, false if it didn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
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
    fn test_comment_view_serializes_author_as_name() {
        let view = CommentView {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            author: "Ada Lovelace".to_string(),
            content: "First".to_string(),
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["author"], "Ada Lovelace");
        assert!(json.get("author_id").is_none());
    }

    // Integration tests for database operations are in tests/model_tests.rs
}
