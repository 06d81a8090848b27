/// HTTP middleware
///
/// - `rate_limit`: per-IP sliding-window limits and quota headers
/// - `security`: OWASP security response headers
/// - `session`: session-cookie / bearer authentication

pub mod rate_limit;
pub mod security;
pub mod session;
