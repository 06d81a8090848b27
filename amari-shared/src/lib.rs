//! # Amari Shared Library
//!
//! Domain types, persistence, and authentication primitives used by the
//! Amari API server.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, opaque tokens, session validation, authorization
//! - `concierge`: Gemini-backed wedding concierge client
//! - `db`: connection pool, migrations, maintenance, admin queries
//! - `models`: database models and CRUD operations
//! - `ratelimit`: in-process sliding-window rate limiting

pub mod auth;
pub mod concierge;
pub mod db;
pub mod models;
pub mod ratelimit;

/// Current version of the Amari shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
