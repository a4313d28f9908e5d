// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use clap::Parser;
use dnsowner::{
    config::Options,
    constants::{METRICS_PATH, TOKIO_WORKER_THREADS},
    metrics::{gather_metrics, LoggingHandler},
    owners::OwnerStack,
    reconciler::{self, OwnerReconciler},
};
use kube::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    let options = Options::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("dnsowner-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(options))
}

async fn async_main(options: Options) -> Result<()> {
    // Respects RUST_LOG if set, otherwise defaults to INFO level.
    // RUST_LOG_FORMAT=json switches to JSON output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting DNS owner controller");

    let metrics_addr = options.validate()?;
    let classes = options.classes()?;
    info!(
        identifier = %options.identifier(),
        classes = %classes,
        setup_workers = options.setup_workers(),
        "Configuration loaded"
    );

    // Build the owner stack: registry at the bottom, optional owner-ID filter above it.
    // Patterns are fixed for the lifetime of the process.
    let (stack, registry) = match options.owner_id_filter() {
        Some(filter) => {
            info!(patterns = ?filter.patterns(), "Restricting owner IDs");
            OwnerStack::with_filters([filter.predicate()])
        }
        None => OwnerStack::new_owners(),
    };
    LoggingHandler::register(&stack.access());
    debug!(stack = ?stack, "Owner stack built");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let reconciler = Arc::new(OwnerReconciler::new(
        registry,
        options.identifier(),
        classes,
    ));

    tokio::select! {
        result = reconciler::run(client, reconciler, options.setup_workers()) => {
            error!("CRITICAL: DNSOwner watch exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("DNSOwner watch exited unexpectedly without error")
        }
        result = serve_metrics(metrics_addr) => {
            error!("CRITICAL: Metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        () = shutdown_signal() => {
            info!("Shutdown signal received, stopping DNS owner controller");
            Ok(())
        }
    }
}

/// Serve Prometheus metrics on `addr`
async fn serve_metrics(addr: SocketAddr) -> Result<()> {
    let app = Router::new().route(METRICS_PATH, get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving metrics on http://{}{}", addr, METRICS_PATH);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    match gather_metrics() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Resolves on SIGINT, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
