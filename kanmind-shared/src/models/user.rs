/// User model and database operations
///
/// This module provides the User model and CRUD operations for user
/// accounts. Users own boards, hold board memberships, author comments, and
/// appear on tasks as assignee or reviewer.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     fullname VARCHAR(255) NOT NULL,
///     bio TEXT,
///     location VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::user::{User, CreateUser};
/// use kanmind_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     fullname: "John Doe".to_string(),
///     bio: None,
///     location: None,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "user@example.com").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User model representing a user account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique case-insensitively
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Display name shown across boards, tasks, and comments
    pub fullname: String,

    /// Optional profile bio
    pub bio: Option<String>,

    /// Optional profile location
    pub location: Option<String>,

    /// When the user account was created
    pub created_at: DateTime<Utc>,

    /// When the user account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never logged in)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Display name
    pub fullname: String,

    /// Optional profile bio
    pub bio: Option<String>,

    /// Optional profile location
    pub location: Option<String>,
}

/// Compact user shape embedded in board/task/comment responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    /// User ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Display name
    pub fullname: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            fullname: user.fullname,
        }
    }
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique index violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, fullname, bio, location)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, fullname, bio, location,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.fullname)
        .bind(data.bio)
        .bind(data.location)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Creates a new user inside an open transaction
    ///
    /// Used by registration so the user row and its first token commit
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique index violation)
    /// - Database connection fails
    pub async fn create_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, fullname, bio, location)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, fullname, bio, location,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.fullname)
        .bind(data.bio)
        .bind(data.location)
        .fetch_one(&mut **tx)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, fullname, bio, location,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, fullname, bio, location,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether an email address is already taken (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))
            "#,
        )
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Checks that every given user ID exists, returning the missing ones
    ///
    /// Used to reject board member lists that reference unknown users.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn missing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM users WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(ids.iter().filter(|id| !found.contains(*id)).copied().collect())
    }

    /// Updates the last login timestamp for a user
    ///
    /// Called after successful authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = NOW()
            WHERE id = $1
            "#,
        )
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
    fn test_user_summary_from_user() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            fullname: "Test User".to_string(),
            bio: Some("bio".to_string()),
            location: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        };

        let summary = UserSummary::from(user.clone());
        assert_eq!(summary.id, user.id);
        assert_eq!(summary.email, "test@example.com");
        assert_eq!(summary.fullname, "Test User");
    }

    #[test]
    fn test_user_summary_serializes_without_password() {
        let summary = UserSummary {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            fullname: "Test User".to_string(),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "test@example.com");
    }

    // Integration tests for database operations are in tests/model_tests.rs
}
