use crate::shared::errors::AppError;
use crate::{log_info, log_warn};
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager, Pool};
use std::time::Duration;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub fn new(database_url: &str) -> Result<Self, AppError> {
        Self::validate_database_url(database_url)?;

        let manager = ConnectionManager::<PgConnection>::new(database_url);

        let pool = r2d2::Pool::builder()
            .max_size(Self::optimal_pool_size())
            .min_idle(Some(2))
            .connection_timeout(Duration::from_secs(10))
            .idle_timeout(Some(Duration::from_secs(300)))
            .max_lifetime(Some(Duration::from_secs(1800)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create connection pool: {}", e))
            })?;

        log_info!(
            "Database connection pool initialized with max_size: {}",
            pool.max_size()
        );

        Ok(Self { pool })
    }

    /// Create a Database instance from an existing pool (useful for testing)
    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    fn validate_database_url(database_url: &str) -> Result<(), AppError> {
        if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
            return Err(AppError::DatabaseError(
                "Invalid database URL format. Must start with postgres:// or postgresql://"
                    .to_string(),
            ));
        }

        // Log the target host without exposing credentials
        log_info!(
            "Initializing database connection to: {}",
            database_url.split('@').next_back().unwrap_or("unknown_host")
        );

        Ok(())
    }

    /// Pool sizing scales with available cores, capped for a single-service deployment.
    fn optimal_pool_size() -> u32 {
        let cpu_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        std::cmp::min(cpu_count * 2, 16) as u32
    }

    pub fn get_connection(&self) -> Result<DbConnection, AppError> {
        let start = std::time::Instant::now();

        match self.pool.get() {
            Ok(conn) => {
                let duration = start.elapsed().as_millis();
                if duration > 100 {
                    log_warn!("Slow connection acquire from pool: {}ms", duration);
                }
                Ok(conn)
            }
            Err(e) => {
                log_warn!("Failed to acquire database connection from pool: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    /// Get the underlying connection pool (useful for testing and store initialization)
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}
