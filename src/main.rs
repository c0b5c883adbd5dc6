//! Command-line interface for pool-exerciser
//!
//! # Usage Examples
//!
//! ```bash
//! # Run until Ctrl-C / SIGTERM
//! pool-exerciser run --config config.yaml
//!
//! # Override settings from the environment
//! MYSQLTESTER_DATABASE_CONCURRENT_WORKERS=20 \
//! MYSQLTESTER_DATABASE_QUERY_INTERVAL=250ms \
//!   pool-exerciser run --config config.yaml
//!
//! # Print the resolved configuration (password redacted)
//! pool-exerciser check --config config.yaml
//! ```

use clap::{Parser, Subcommand};
use pool_exerciser::{load_config, run_exerciser};
use std::future::Future;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pool-exerciser")]
#[command(about = "Drive a MySQL connection pool with paced queries and export pool metrics")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the workers and serve metrics until interrupted
    Run {
        /// Path to the YAML configuration file
        #[arg(long, env = "POOL_EXERCISER_CONFIG", default_value = "config.yaml")]
        config: PathBuf,
    },
    /// Validate the configuration and print it with secrets redacted
    Check {
        /// Path to the YAML configuration file
        #[arg(long, env = "POOL_EXERCISER_CONFIG", default_value = "config.yaml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let file = load_config(&config)?;
            init_tracing(file.debug);
            let settings = file.resolve()?;

            info!("Loaded configuration from {}", config.display());
            let shutdown = shutdown_signal()?;
            run_exerciser(&settings, shutdown).await?;
        }
        Commands::Check { config } => {
            let file = load_config(&config)?;
            init_tracing(file.debug);
            let settings = file.resolve()?;
            println!("{settings}");
        }
    }

    Ok(())
}

/// Future that completes on SIGINT or SIGTERM.
#[cfg(unix)]
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()>> {
    use anyhow::Context;
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => info!(signal = "SIGINT", "shutdown signal"),
            _ = sigterm.recv() => info!(signal = "SIGTERM", "shutdown signal"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal"),
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await
            }
        }
    })
}
