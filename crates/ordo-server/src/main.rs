// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Ordo Server - HTTP read API for liturgical calendar data.
//!
//! Starts the calendar API in the configured read mode: `cache` connects to the
//! database, `live` configures the compute engine.

use std::sync::Arc;

use axum::http::Request;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Level, error, info};

use ordo_core::compute::engine_from_config;
use ordo_core::config::{DatabaseConfig, EngineConfig};
use ordo_core::persistence::{self, CalendarStore};
use ordo_core::read::{CacheReader, CalendarReader, LiveReader};
use ordo_server::{AppState, ReadMode, ServerConfig, router};

/// HTTP read API for precomputed liturgical calendar data.
#[derive(Parser, Debug)]
#[command(name = "ordo-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,

    /// Override the listen address.
    #[arg(long)]
    bind: Option<String>,

    /// Override the read mode (cache or live).
    #[arg(long)]
    mode: Option<ReadMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ordo_server=info".parse()?)
                .add_directive("ordo_core=info".parse()?),
        )
        .init();

    info!("Starting Ordo Server");

    let mut config = ServerConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(mode) = args.mode {
        config.read_mode = mode;
    }

    let (reader, store): (Arc<dyn CalendarReader>, Option<Arc<dyn CalendarStore>>) =
        match config.read_mode {
            ReadMode::Cache => {
                let db_config = DatabaseConfig::from_env()?;
                info!("Connecting to database...");
                let store = persistence::connect(&db_config).await?;
                if !store.health_check_db().await? {
                    anyhow::bail!("database health check failed");
                }
                info!(backend = store.backend(), "Database ready");
                (Arc::new(CacheReader::new(store.clone())), Some(store))
            }
            ReadMode::Live => {
                let engine_config = EngineConfig::from_env()?;
                let engine = engine_from_config(&engine_config);
                info!(
                    engine = engine.engine_type(),
                    program = %engine_config.program,
                    timeout_secs = engine_config.timeout.as_secs(),
                    "Engine configured"
                );
                (Arc::new(LiveReader::new(engine)), None)
            }
        };

    let state = AppState::new(reader, config.read_mode);

    let app = router(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    query = request.uri().query().unwrap_or("")
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, mode = %config.read_mode, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutting down...");
        })
        .await?;

    if let Some(store) = store {
        store.close().await;
    }
    info!("Shutdown complete");

    Ok(())
}
