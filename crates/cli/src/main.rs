//! `scriptkeeper`: apply, read, delete and plan stored scripts from the
//! command line.

mod declaration;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scriptkeeper_reconcile::StoredScriptController;
use scriptkeeper_store::config::ConnectionConfig;
use scriptkeeper_store::ScriptStoreApi;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "scriptkeeper")]
#[command(about = "Reconcile stored scripts and search templates with a search cluster")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create or replace a stored script and print what the cluster persisted
    Apply {
        /// JSON declaration file (`-` for stdin)
        file: PathBuf,
    },

    /// Read a stored script by id
    Read {
        /// Composite id returned by `apply`
        id: String,
    },

    /// Delete a stored script by id
    Delete {
        /// Composite id returned by `apply`
        id: String,
    },

    /// Show what `apply` would change
    Plan {
        /// JSON declaration file (`-` for stdin)
        file: PathBuf,

        /// Id recorded by a previous apply
        #[arg(long)]
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scriptkeeper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // --- Connection ---
    let config = ConnectionConfig::from_env().context("Invalid connection configuration")?;
    let api = ScriptStoreApi::from_config(&config).context("Failed to build cluster client")?;
    tracing::debug!(endpoint = %api.base_url(), "Using cluster endpoint");
    let controller = StoredScriptController::new(Arc::new(api));

    // --- Cancellation ---
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    match cli.command {
        Command::Apply { file } => {
            let declared = declaration::load(&file)?;
            print_json(&controller.apply(&declared, &cancel).await?)
        }
        Command::Read { id } => print_json(&controller.read(&id, &cancel).await?),
        Command::Delete { id } => print_json(&controller.delete(&id, &cancel).await?),
        Command::Plan { file, id } => {
            let declared = declaration::load(&file)?;
            print_json(&controller.plan(&declared, id.as_deref(), &cancel).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Wait for Ctrl-C (or SIGTERM on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), cancelling"),
        () = terminate => tracing::info!("Received SIGTERM, cancelling"),
    }
}
