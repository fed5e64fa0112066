// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP service
//!
//! Loads configuration, wires the services and serves the API until
//! Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use entrypoint_core::application::build_services;
use entrypoint_core::domain::service_config::ServiceConfig;
use entrypoint_core::presentation::api::{app, AppState, TokenAuth};

#[derive(Args)]
pub struct ServeArgs {
    /// Bind address (overrides config)
    #[arg(long, env = "ENTRYPOINT_HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long)]
    port: Option<u16>,
}

pub async fn run(args: ServeArgs, config_override: Option<PathBuf>) -> Result<()> {
    let mut config = ServiceConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.bind_address = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let services = build_services(&config).await?;
    let token = config
        .resolved_api_token()
        .context("Failed to resolve api_token")?;

    let state = Arc::new(AppState {
        manager: services.manager,
        launcher: services.launcher,
        auth: TokenAuth::new(token),
    });

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Entrypoint service listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Entrypoint service shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
