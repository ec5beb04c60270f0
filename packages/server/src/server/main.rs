// Main entry point for the listing worker

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worker_core::domains::listings::{ListingRepository, PostgresListingRepository};
use worker_core::domains::scraping::{ScraperRegistry, ScraperService};
use worker_core::kernel::jobs::{JobDefinition, JobRunner, JobRunnerConfig, JobScheduler};
use worker_core::kernel::{NatsClientPublisher, NatsNotifier, Notifier, PostgresLockStore};
use worker_core::server::{build_app, AppState};
use worker_core::{load_sites, Config, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,worker_core=debug,sqlx=warn".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    tracing::info!(worker_id = %config.worker_id, "Starting listing worker");

    let sites = load_sites(&config.sites_config)
        .with_context(|| format!("Failed to load sites from {}", config.sites_config.display()))?;
    tracing::info!(sites = sites.len(), "Site configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Connect to NATS
    let publisher = NatsClientPublisher::connect(&config.nats_url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats_url))?;
    tracing::info!(url = %config.nats_url, "NATS connected");

    let notifier: Arc<dyn Notifier> = Arc::new(NatsNotifier::new(
        Arc::new(publisher),
        config.notification_subject.clone(),
    ));
    let repository: Arc<dyn ListingRepository> =
        Arc::new(PostgresListingRepository::new(pool.clone()));

    let registry =
        ScraperRegistry::from_sites(&sites).context("Failed to build scraper registry")?;
    let workflow = Arc::new(ScraperService::new(
        registry,
        repository.clone(),
        notifier.clone(),
    ));

    let runner = JobRunner::new(
        Arc::new(PostgresLockStore::new(pool.clone())),
        workflow.clone(),
        notifier,
        JobRunnerConfig::with_worker_id(config.worker_id.clone()).with_lock_ttl(config.lock_ttl),
    );
    let scheduler = Arc::new(
        JobScheduler::new(runner)
            .await
            .context("Failed to create job scheduler")?,
    );

    for site in sites.iter().filter(|s| s.enabled) {
        if !workflow.registry().contains(&site.name) {
            continue;
        }
        scheduler
            .add_job(JobDefinition::from(site))
            .await
            .with_context(|| format!("Failed to schedule site {}", site.name))?;
    }
    scheduler
        .start()
        .await
        .context("Failed to start job scheduler")?;

    let app = build_app(AppState {
        scheduler: scheduler.clone(),
        repository,
        worker_id: config.worker_id.clone(),
    });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!(timeout_secs = config.shutdown_timeout.as_secs(), "Stopping scheduler");
    if !scheduler.stop(config.shutdown_timeout).await {
        tracing::warn!("Exited with jobs still running");
    }
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
