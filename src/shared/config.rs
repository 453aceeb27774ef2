//! Service configuration, loaded from environment variables at startup.

use crate::shared::errors::{AppError, AppResult};

/// Runtime configuration for the image processing service.
///
/// Credentials and endpoints have no defaults: startup fails fast when one
/// is missing rather than limping along and erroring on the first job.
#[derive(Debug, Clone)]
pub struct Config {
    /// Supabase project URL, e.g. `https://abc.supabase.co`.
    pub supabase_url: String,

    /// Service-role key used for storage uploads and deletes.
    pub supabase_service_key: String,

    /// Storage bucket holding raw and processed images.
    pub storage_bucket: String,

    /// remove.bg API key.
    pub remove_bg_api_key: String,

    /// Postgres connection string for the task record store.
    pub database_url: String,

    /// TCP address the webhook server binds (default: `"0.0.0.0:8787"`).
    pub bind_address: String,

    /// When `true`, a job that exhausts its retries writes `failed` to the
    /// task record instead of leaving it at `ongoing`.
    pub mark_failed_on_exhaustion: bool,

    /// When `false`, skip the mirror / re-encode step and store the
    /// background-removed bytes as-is.
    pub reencode: bool,
}

impl Config {
    /// Build [`Config`] from environment variables.
    ///
    /// Returns [`AppError::ConfigError`] naming the first missing required
    /// variable.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            supabase_url: required("SUPABASE_URL")?,
            supabase_service_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            storage_bucket: required("SUPABASE_STORAGE_BUCKET")?,
            remove_bg_api_key: required("REMOVE_BG_API_KEY")?,
            database_url: required("DATABASE_URL")?,
            bind_address: env_or("CUTOUT_BIND_ADDR", "0.0.0.0:8787"),
            mark_failed_on_exhaustion: env_flag("CUTOUT_MARK_FAILED_ON_EXHAUSTION", false),
            reencode: env_flag("CUTOUT_REENCODE", true),
        })
    }
}

fn required(key: &str) -> AppResult<String> {
    std::env::var(key)
        .map_err(|_| AppError::ConfigError(format!("Missing required environment variable {}", key)))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}
