/// Database layer for Amari
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: embedded migration runner
/// - `maintenance`: purging of expired sessions and reset tokens
/// - `admin_query`: allow-listed raw SQL for the admin console
/// - Models are in the `models` module at crate root level

pub mod admin_query;
pub mod maintenance;
pub mod migrations;
pub mod pool;
