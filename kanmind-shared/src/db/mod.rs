/// Database utilities
///
/// This module provides the PostgreSQL connection pool and the migration
/// runner used by the API server and by integration tests.
///
/// # Modules
///
/// - `pool`: Connection pool creation and health checks
/// - `migrations`: sqlx migration runner

pub mod migrations;
pub mod pool;
