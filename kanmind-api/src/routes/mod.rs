/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (registration, login, email check)
/// - `boards`: Board CRUD with aggregated summaries
/// - `tasks`: Task CRUD and the filtered assigned/reviewing views
/// - `comments`: Comments nested under tasks

pub mod auth;
pub mod boards;
pub mod comments;
pub mod health;
pub mod tasks;
