/// Middleware modules for the API server
///
/// - `security`: security response headers
/// - `guard`: per-route policy checks

pub mod guard;
pub mod security;
