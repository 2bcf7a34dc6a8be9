//! # KanMind Shared Library
//!
//! This crate contains the database models, authentication primitives, and
//! the board-access policy shared by the KanMind API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Password hashing, token auth middleware, and the access policy
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the KanMind shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
