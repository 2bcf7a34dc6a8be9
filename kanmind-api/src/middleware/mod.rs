/// HTTP middleware for the API server
///
/// # Modules
///
/// - `security`: Security response headers

pub mod security;
