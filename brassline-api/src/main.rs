use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use brassline_api::{app, tracking::VisitTracker, worker, AppState, AuthConfig, Repositories};
use brassline_core::ImageHost;
use brassline_store::{app_config::Config, CdnImageHost, DbClient, InMemoryImageHost};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brassline_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        "Starting Brassline API on port {} ({})",
        config.server.port,
        config.server.environment
    );

    // Database, unless running in-memory
    let db = if config.database.is_in_memory() {
        tracing::warn!("No database URL configured, using in-memory storage");
        None
    } else {
        let db = DbClient::connect_with_retry(&config.database)
            .await
            .context("Failed to connect to database")?;
        db.migrate().await.context("Failed to run migrations")?;
        Some(Arc::new(db))
    };

    let repos = match &db {
        Some(db) => Repositories::postgres(db),
        None => Repositories::in_memory(),
    };

    let images: Arc<dyn ImageHost> = if config.uploads.cdn_base_url.is_empty() {
        Arc::new(InMemoryImageHost::new())
    } else {
        Arc::new(CdnImageHost::new(
            config.uploads.cdn_base_url.clone(),
            config.uploads.cdn_api_key.clone(),
        ))
    };

    // Visit tracking queue and its worker
    let (tracker, visit_rx) = VisitTracker::new(config.tracking.queue_capacity);
    let visit_worker = tokio::spawn(worker::run_visit_worker(visit_rx, repos.visits.clone()));

    let rules = config
        .business_rules
        .pricing_rules()
        .context("Invalid business rules")?;

    let app_state = AppState::new(
        repos,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
            admin_api_key: config.auth.admin_api_key.clone(),
        },
        rules,
        config.business_rules.transition_policy(),
        tracker,
        images,
    )
    .with_cron_secret(config.cron.secret.clone())
    .with_max_upload_bytes(config.uploads.max_bytes)
    .with_development(config.server.is_development());

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Senders went away with the router; give the worker a moment to drain
    match tokio::time::timeout(Duration::from_secs(5), visit_worker).await {
        Ok(Err(e)) => tracing::error!("Visit worker panicked: {}", e),
        Err(_) => tracing::warn!("Visit worker did not drain in time"),
        Ok(Ok(())) => {}
    }

    if let Some(db) = db {
        db.close().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
