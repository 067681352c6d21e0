//! Clip compilation worker binary.
//!
//! Usage: `clipfarm-worker [creator]`. Without an argument the creator is
//! read from `CLIPFARM_CREATOR`.

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipfarm_twitch::TwitchConfig;
use clipfarm_worker::{build_pipeline, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clipfarm=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let config = WorkerConfig::from_env();

    let Some(creator) = std::env::args().nth(1).or_else(|| config.creator.clone()) else {
        error!("No creator given: pass it as the first argument or set CLIPFARM_CREATOR");
        std::process::exit(2);
    };

    info!(creator = %creator, "Starting clipfarm-worker");
    info!("Worker config: {:?}", config);

    let twitch = match TwitchConfig::from_env() {
        Ok(t) => t,
        Err(e) => {
            error!("Invalid Twitch configuration: {}", e);
            std::process::exit(1);
        }
    };

    let (cancel_tx, cancel_rx) = watch::channel(false);

    let orchestrator = match build_pipeline(config, twitch, cancel_rx.clone()).await {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to set up pipeline: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl-C cancels the run; cleanup still happens
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, cancelling run");
            let _ = cancel_tx.send(true);
        }
    });

    match orchestrator.run(&creator, cancel_rx).await {
        Ok(report) => match serde_json::to_string(&report) {
            Ok(json) => info!(report = %json, "Run finished"),
            Err(_) => info!("Run finished: {:?}", report),
        },
        Err(e) => {
            error!("Run failed: {}", e);
            std::process::exit(1);
        }
    }
}
