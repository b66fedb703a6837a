use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemAssetStore;
use server::config::AppConfig;
use server::service::{UsuarioService, spawn_sweep_task};
use server::state::AppState;
use server::store::{MemoryUsuarioStore, SeaOrmUsuarioStore, UsuarioStore};
use server::{build_router, database};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let store: Arc<dyn UsuarioStore> = if config.database.is_memory() {
        warn!("Using the in-memory store, records are lost on shutdown");
        Arc::new(MemoryUsuarioStore::new())
    } else {
        let db = database::init_db(&config.database.url)
            .await
            .context("Failed to connect to database")?;
        info!("Database connected and schema synced");
        Arc::new(SeaOrmUsuarioStore::new(db))
    };

    let assets = FilesystemAssetStore::from_config(&config.storage)
        .await
        .context("Failed to prepare the image directory")?;
    info!(path = %assets.base_path().display(), "Image directory ready");

    let service = Arc::new(UsuarioService::new(
        store,
        Arc::new(assets),
        config.storage.replace_strategy,
    ));

    let grace = config.storage.orphan_grace();
    if config.storage.sweep_on_startup {
        match service.sweep_orphans(grace).await {
            Ok(report) => info!(
                scanned = report.scanned,
                removed = report.removed.len(),
                staging_purged = report.staging_purged,
                "Startup orphan sweep finished"
            ),
            Err(e) => warn!(error = %e, "Startup orphan sweep failed"),
        }
    }
    let sweeper = config
        .storage
        .sweep_interval()
        .map(|interval| spawn_sweep_task(service.clone(), interval, grace));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        service,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
