/// Database models for KanMind
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and profile data
/// - `auth_token`: Opaque bearer tokens issued at login/registration
/// - `board`: Boards, memberships, and the aggregated board summary
/// - `task`: Tasks with status/priority and assignee/reviewer relations
/// - `comment`: Author-attributed comments on tasks
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
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     fullname: "John Doe".to_string(),
///     bio: None,
///     location: None,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod auth_token;
pub mod board;
pub mod comment;
pub mod task;
pub mod user;
