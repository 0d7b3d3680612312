#![doc = include_str!("../README.md")]

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::config::{CliArgs, CliConfig};
use cli::output::render;
use cli::telemetry::init_telemetry;
use fanout::{Contains, Coordinator, FileSource};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let coordinator = Coordinator::new(config.pool.clone())?;
    let signals = tokio::spawn(shutdown_signal(coordinator.cancellation_token()));

    let source = FileSource::new(&config.input);
    let filter = Contains::new(config.pattern.as_str()).ignore_case(config.ignore_case);
    let result = coordinator.execute(source, filter).await;
    signals.abort();

    let report =
        result.with_context(|| format!("failed to process {}", config.input.display()))?;

    println!("{}", render(&report, config.format)?);

    if report.is_cancelled() {
        eprintln!(
            "Run cancelled: the count covers only the {} items processed before cancellation",
            report.processed
        );
    }
    for failure in &report.failures {
        eprintln!(
            "Worker {} failed and was not replaced: {}",
            failure.worker_id, failure.message
        );
    }

    Ok(())
}

fn log_startup_info(config: &CliConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting run with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting run over {} with {} workers",
            config.input.display(),
            config.pool.workers
        );
    }
}

async fn shutdown_signal(token: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Cancelling run...");
    token.cancel();
}
