// offline-agent - Offline-first caching agent for a web application
// Author: kelexine (https://github.com/kelexine)

use anyhow::{Context, Result};
use clap::Parser;
use offline_agent::agent::{AgentEvent, CacheLifecycleManager};
use offline_agent::cache::{CacheStorage, MemoryCacheStorage, SqliteCacheStorage};
use offline_agent::cli::Args;
use offline_agent::config::{AppConfig, CacheConfig, StorageBackend};
use offline_agent::network::HttpNetwork;
use offline_agent::server::create_router;
use offline_agent::utils::logging;
use reqwest::Url;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration, CLI overrides last
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting offline-agent v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Wire the agent to its collaborators
    let origin = Url::parse(&config.agent.origin).context("invalid origin")?;
    let network = HttpNetwork::new(&config.network, origin)?;
    let storage = open_storage(&config.cache)?;
    let agent = CacheLifecycleManager::new(
        &config.agent,
        &config.notification,
        storage,
        Arc::new(network),
    )?;
    info!(
        "Fronting {} with cache {}",
        config.agent.origin, config.agent.cache_version
    );

    // Phase 4: Register: install, then take control
    if args.no_lifecycle {
        warn!("Lifecycle signals skipped; deliver them via the admin API");
    } else {
        agent.handle_event(AgentEvent::Install).await?;
        agent.handle_event(AgentEvent::Activate).await?;
    }

    // Phase 5: Build and start HTTP server
    let app = create_router(config.clone(), agent)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting proxy on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Proxy shut down gracefully");
    Ok(())
}

fn open_storage(config: &CacheConfig) -> Result<Arc<dyn CacheStorage>> {
    match config.backend {
        StorageBackend::Memory => {
            warn!("Cache stores are kept in memory and lost on exit");
            Ok(Arc::new(MemoryCacheStorage::new()))
        }
        StorageBackend::Sqlite => {
            let storage = match &config.path {
                Some(path) => SqliteCacheStorage::open(path)?,
                None => SqliteCacheStorage::open_default()?,
            };
            Ok(Arc::new(storage))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
