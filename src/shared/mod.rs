// Shared kernel: configuration, database access, errors and utilities
// used by every module.

pub mod config;
pub mod database;
pub mod errors;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use database::{Database, DbConnection, DbPool};
pub use errors::{AppError, AppResult};
