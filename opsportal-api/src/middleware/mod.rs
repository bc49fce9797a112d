/// HTTP middleware for the API server
///
/// - `request_meta`: client IP / User-Agent capture for audit events
/// - `security`: OWASP security headers on every response

pub mod request_meta;
pub mod security;
