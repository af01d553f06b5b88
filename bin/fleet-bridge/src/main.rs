//! Wires every crate in the workspace into one running process: the
//! ingestion subscriber (C4/C5), the outbound transports (C8), and the HTTP
//! API (C10), all sharing one database pool, one cache connection, one
//! sequence allocator (spec §6's composition root).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use fleet_api::AppState;
use fleet_cache::RedisLiveStateCache;
use fleet_codec::SequenceAllocator;
use fleet_db::{DbPool, UnitOfWork};
use fleet_ingest::{ReactiveScheduler, Subscriber};
use fleet_transport::{BrokerTransport, HttpTransport, TransportKind, TransportRegistry, WebSocketTransport};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Command-line overrides, layered on top of `fleet_config::AppConfig` (spec
/// §6: environment variables are the primary configuration source; these
/// flags exist for local runs and smoke tests).
#[derive(Debug, Parser)]
#[command(name = "fleet-bridge", about = "VDA5050 fleet bridge: broker <-> operator control plane")]
struct Cli {
    /// Overrides `HTTP_BIND_ADDR` / the config default.
    #[arg(long, env = "FLEET_BRIDGE_BIND_ADDR")]
    bind_addr: Option<String>,

    /// Overrides `LOG_LEVEL` / the config default.
    #[arg(long)]
    log_level: Option<String>,

    /// Connect to Postgres, run migrations, then exit without starting the
    /// broker subscriber or HTTP server.
    #[arg(long)]
    migrate_only: bool,
}

/// Distinct nonzero exit codes per failing subsystem (spec §6).
const EXIT_CONFIG_FAILED: i32 = 1;
const EXIT_DB_FAILED: i32 = 2;
const EXIT_CACHE_FAILED: i32 = 3;
const EXIT_BROKER_FAILED: i32 = 4;
const EXIT_INGEST_FAILED: i32 = 5;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match fleet_config::AppConfig::load().context("failed to load configuration") {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(EXIT_CONFIG_FAILED);
        }
    };
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(version = %config.app_version, "starting fleet-bridge");

    let db = match DbPool::connect(&config.db.connection_url()).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to database / run migrations");
            std::process::exit(EXIT_DB_FAILED);
        }
    };
    info!("database connected, migrations applied");

    if cli.migrate_only {
        info!("--migrate-only set, exiting after migrations");
        std::process::exit(0);
    }

    let cache: Arc<dyn fleet_cache::LiveStateCache> = match RedisLiveStateCache::connect(&config.cache.connection_url()).await {
        Ok(cache) => Arc::new(cache),
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to cache");
            std::process::exit(EXIT_CACHE_FAILED);
        }
    };
    info!("cache connected");

    let uow = UnitOfWork::new(db);
    let sequence = Arc::new(SequenceAllocator::new());

    let mut registry = TransportRegistry::new(TransportKind::Broker);
    let broker = match BrokerTransport::connect(
        &config.broker.url,
        &config.broker.client_id,
        config.broker.username.as_deref(),
        config.broker.password.as_deref(),
    )
    .await
    {
        Ok(broker) => Arc::new(broker),
        Err(err) => {
            tracing::error!(error = %err, "failed to connect broker transport");
            std::process::exit(EXIT_BROKER_FAILED);
        }
    };
    registry.register(TransportKind::Broker, broker.clone());

    if let Some(template) = &config.transport.http_endpoint_template {
        registry.register(
            TransportKind::Http,
            Arc::new(HttpTransport::new(
                template.clone(),
                config.transport.http_bearer_token.clone(),
                config.app_version.clone(),
            )),
        );
        info!("HTTP transport registered");
    }
    if let Some(template) = &config.transport.websocket_endpoint_template {
        registry.register(TransportKind::WebSocket, Arc::new(WebSocketTransport::new(template.clone())));
        info!("WebSocket transport registered");
    }
    let transport = Arc::new(registry);

    let reactive = Arc::new(ReactiveScheduler::new(
        sequence.clone(),
        transport.clone(),
        config.topic_prefix.clone(),
        config.default_manufacturer.clone(),
    ));

    let ingest_shutdown = CancellationToken::new();
    let subscriber = match Subscriber::connect(
        &config.broker.url,
        &config.broker.client_id,
        config.broker.username.as_deref(),
        config.broker.password.as_deref(),
        &config.topic_prefix,
        uow.clone(),
        cache.clone(),
        reactive,
        ingest_shutdown.clone(),
    )
    .await
    {
        Ok(subscriber) => subscriber,
        Err(err) => {
            tracing::error!(error = %err, "failed to start ingestion subscriber");
            std::process::exit(EXIT_INGEST_FAILED);
        }
    };
    info!("ingestion subscriber running");

    let state = Arc::new(AppState {
        uow,
        cache,
        transport: transport.clone(),
        sequence,
        topic_prefix: config.topic_prefix.clone(),
        default_manufacturer: config.default_manufacturer.clone(),
        app_version: config.app_version.clone(),
    });

    let bind_addr = cli.bind_addr.unwrap_or(config.http_bind_addr.clone());
    let shutdown = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl-c");
        info!("shutdown signal received, draining HTTP connections");
    };

    // The 30s HTTP drain deadline (spec §5) bounds `serve`'s whole run from
    // the moment the signal fires, not just the time after drain starts.
    match tokio::time::timeout(Duration::from_secs(30), fleet_api::serve(&bind_addr, state, shutdown)).await {
        Ok(Ok(())) => info!("HTTP server exited cleanly"),
        Ok(Err(err)) => warn!(error = %err, "HTTP server exited with an error"),
        Err(_) => warn!("HTTP drain deadline (30s) elapsed, forcing shutdown"),
    }

    ingest_shutdown.cancel();
    if let Err(err) = subscriber.disconnect().await {
        warn!(error = %err, "ingestion subscriber disconnect failed");
    }
    if let Err(err) = transport.close_all().await {
        warn!(error = %err, "transport shutdown failed");
    }

    info!("fleet-bridge stopped");
}
