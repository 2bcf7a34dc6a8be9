/// Authentication and authorization utilities
///
/// This module provides the security primitives for KanMind:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`middleware`]: Token authentication middleware for Axum
/// - [`policy`]: The centralized board-access policy
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Bearer Tokens**: CSPRNG-generated, SHA-256 hashed at rest
/// - **Constant-time Comparison**: Password verification via argon2's
///   constant-time verifier
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod middleware;
pub mod password;
pub mod policy;
