/// Opaque bearer token model
///
/// This module provides the AuthToken model backing `Authorization: Token`
/// authentication. Tokens are issued at registration and login and carry no
/// expiry; a user may hold several at once (one per login).
///
/// # Security
///
/// - Tokens are stored as SHA-256 hashes (never plaintext)
/// - The plaintext is 40 hex characters from 20 CSPRNG bytes
/// - The full token is only returned on issue (never again)
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_hash VARCHAR(64) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::auth_token::AuthToken;
/// use kanmind_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let user_id = Uuid::new_v4();
///
/// let (token, plaintext) = AuthToken::issue(&pool, user_id).await?;
///
/// // IMPORTANT: hand plaintext to the client now - it is never shown again
/// let user = AuthToken::resolve_user(&pool, &plaintext).await?;
/// assert!(user.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::User;

/// Auth token record (hash only, never the plaintext)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthToken {
    /// Unique token record ID
    pub id: Uuid,

    /// User this token authenticates
    pub user_id: Uuid,

    /// SHA-256 hash of the plaintext token (hex, 64 chars)
    pub token_hash: String,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Generates a secure random token
    ///
    /// Format: 40 lowercase hex characters (20 random bytes).
    ///
    /// # Example
    ///
    /// ```
    /// use kanmind_shared::models::auth_token::AuthToken;
    ///
    /// let token = AuthToken::generate_token();
    /// assert_eq!(token.len(), 40);
    /// assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    /// ```
    pub fn generate_token() -> String {
        use rand::RngCore;

        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Hashes a token with SHA-256
    ///
    /// # Example
    ///
    /// ```
    /// use kanmind_shared::models::auth_token::AuthToken;
    ///
    /// let hash = AuthToken::hash_token("sometoken");
    /// assert_eq!(hash.len(), 64);
    /// ```
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Issues a new token for a user
    ///
    /// Returns both the database record and the plaintext token.
    /// **IMPORTANT**: The plaintext is only returned once and never stored!
    /// Previously issued tokens for the same user stay valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn issue(pool: &PgPool, user_id: Uuid) -> Result<(Self, String), sqlx::Error> {
        let plaintext = Self::generate_token();
        let token_hash = Self::hash_token(&plaintext);

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (user_id, token_hash)
            VALUES ($1, $2)
            RETURNING id, user_id, token_hash, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .fetch_one(pool)
        .await?;

        Ok((token, plaintext))
    }

    /// Issues a new token inside an open transaction
    ///
    /// Used by registration so the user row and its first token commit
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn issue_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: Uuid,
    ) -> Result<(Self, String), sqlx::Error> {
        let plaintext = Self::generate_token();
        let token_hash = Self::hash_token(&plaintext);

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (user_id, token_hash)
            VALUES ($1, $2)
            RETURNING id, user_id, token_hash, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .fetch_one(&mut **tx)
        .await?;

        Ok((token, plaintext))
    }

    /// Resolves a plaintext token to its user
    ///
    /// Hashes the presented token and joins against the users table.
    ///
    /// # Returns
    ///
    /// The authenticated user if the token is known, None otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn resolve_user(pool: &PgPool, token: &str) -> Result<Option<User>, sqlx::Error> {
        let token_hash = Self::hash_token(token);

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.fullname, u.bio, u.location,
                   u.created_at, u.updated_at, u.last_login_at
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes every token held by a user
    ///
    /// # Returns
    ///
    /// Number of tokens removed
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_format() {
        let token = AuthToken::generate_token();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_is_random() {
        let a = AuthToken::generate_token();
        let b = AuthToken::generate_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_token_is_deterministic() {
        let token = "sometoken";
        assert_eq!(AuthToken::hash_token(token), AuthToken::hash_token(token));
    }

    #[test]
    fn test_hash_token_hex_length() {
        let hash = AuthToken::hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_differs_per_token() {
        assert_ne!(AuthToken::hash_token("a"), AuthToken::hash_token("b"));
    }

    // Integration tests for issue/resolve are in tests/model_tests.rs
}
