//! Service entry point.
//!
//! Startup order:
//! 1. Load `.env` and initialize logging.
//! 2. Read configuration from the environment (missing credentials are fatal).
//! 3. Open the Postgres pool and run pending migrations.
//! 4. Wire stores and clients, start the pipeline worker.
//! 5. Serve the webhook endpoint until SIGINT/SIGTERM, then drain the worker.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tokio_util::sync::CancellationToken;

use cutout::modules::pipeline::{
    ImageProcessor, InProcessJobQueue, JobQueue, PipelineConfig, PipelineWorker,
};
use cutout::modules::records::{PgTaskRecordStore, TaskRecordStore};
use cutout::modules::removebg::{BackgroundRemover, RemoveBgClient};
use cutout::modules::storage::{ObjectStore, SupabaseStorageClient};
use cutout::modules::webhook::WebhookDispatcher;
use cutout::server::{build_router, AppState};
use cutout::shared::utils::init_logger;
use cutout::shared::{Config, Database};
use cutout::{log_error, log_info, log_warn};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_logger();

    if let Err(e) = run().await {
        log_error!("Startup failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let database = Database::new(&config.database_url)?;
    run_migrations(&database)?;

    let records: Arc<dyn TaskRecordStore> =
        Arc::new(PgTaskRecordStore::new(database.pool().clone()));
    let storage: Arc<dyn ObjectStore> = Arc::new(SupabaseStorageClient::new(
        &config.supabase_url,
        &config.supabase_service_key,
        &config.storage_bucket,
    )?);
    let remover: Arc<dyn BackgroundRemover> = Arc::new(RemoveBgClient::new(
        &config.remove_bg_api_key,
    )?);

    let pipeline_config = PipelineConfig {
        reencode: config.reencode,
        mark_failed_on_exhaustion: config.mark_failed_on_exhaustion,
        ..PipelineConfig::default()
    };
    let job_timeout = pipeline_config.job_timeout;
    let processor = Arc::new(ImageProcessor::new(
        Arc::clone(&records),
        Arc::clone(&storage),
        remover,
        pipeline_config,
    ));

    let (queue, receiver) = InProcessJobQueue::new();
    let queue: Arc<dyn JobQueue> = Arc::new(queue);

    let cancel = CancellationToken::new();
    let worker = PipelineWorker::new(Arc::clone(&processor), job_timeout);
    let worker_cancel = cancel.clone();
    let worker_handle = tokio::spawn(worker.run(receiver, worker_cancel));

    let state = Arc::new(AppState {
        dispatcher: WebhookDispatcher::new(storage, queue),
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    log_info!("Webhook server listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Webhook server failed")?;

    // Let in-flight jobs finish before the process exits.
    cancel.cancel();
    if let Err(e) = worker_handle.await {
        log_warn!("Pipeline worker task ended abnormally: {}", e);
    }

    log_info!("Shutdown complete");
    Ok(())
}

fn run_migrations(database: &Database) -> anyhow::Result<()> {
    let mut conn = database.get_connection()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    log_info!("Database migrations completed");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_warn!("Failed to install Ctrl-C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => log_warn!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    log_info!("Shutdown signal received");
}
