//! `fleet-dispatch` command-line client.
//!
//! Dispatches commands and queries to a fleet of units, waits for their
//! results and prints them as JSON on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet_dispatch::coverage::ResourceFamily;
use fleet_dispatch::fleet::{Command, CommandArg, HttpTransport, UnitTarget};
use fleet_dispatch::infrastructure::{config::Settings, telemetry::TelemetryBuilder};
use fleet_dispatch::session::FleetSession;
use serde::Serialize;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fleet-dispatch")]
#[command(
    about = "Dispatch commands to a fleet of units and collect their results",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command on one unit or on every unit ('$broadcast')
    Dispatch {
        /// Unit name, or '$broadcast'
        unit: UnitTarget,
        /// Command name
        command: String,
        /// Positional arguments
        args: Vec<String>,
        /// Keyword options as key=value
        #[arg(long = "option", short = 'o', value_parser = parse_option)]
        options: Vec<(String, String)>,
    },
    /// Read a resource from one unit or from every unit
    Query {
        /// Unit name, or '$broadcast'
        unit: UnitTarget,
        /// Resource name, e.g. 'calibrations'
        resource: String,
    },
    /// Print the unit x device coverage matrix
    Coverage {
        /// Resource family
        #[arg(default_value = "calibrations")]
        family: ResourceFamily,
    },
}

fn parse_option(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Settings::new().context("Failed to load configuration")?;

    let provider = TelemetryBuilder::from_settings(&config.telemetry, env!("CARGO_PKG_VERSION"))
        .init()
        .context("Failed to initialize telemetry")?;

    let transport_config = config.fleet.transport_config()?;
    info!(base_url = %transport_config.base_url, "Fleet dispatch starting");
    let transport =
        HttpTransport::new(transport_config).context("Failed to build HTTP transport")?;
    let session = FleetSession::new(Arc::new(transport), config.polling.poll_config());

    let outcome = tokio::select! {
        res = execute(&session, cli.command) => res,
        () = shutdown_signal() => {
            info!("Shutdown signal received, cancelling in-flight tasks");
            session.close();
            Err(anyhow::anyhow!("Interrupted"))
        }
    };

    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            error!("Failed to flush spans: {:?}", e);
        }
    }

    outcome
}

async fn execute(session: &FleetSession, command: Commands) -> Result<()> {
    match command {
        Commands::Dispatch {
            unit,
            command,
            args,
            options,
        } => {
            let mut cmd = Command::new(command, unit);
            for arg in &args {
                cmd = cmd.arg(CommandArg::parse_lossy(arg));
            }
            for (key, value) in options {
                cmd = cmd.option(key, CommandArg::parse_lossy(&value));
            }
            let results = session.run(&cmd).await.context("Command failed")?;
            print_json(&results)
        }
        Commands::Query { unit, resource } => {
            let results = session
                .fetch::<serde_json::Value>(&resource, &unit)
                .await
                .context("Query failed")?;
            print_json(&results)
        }
        Commands::Coverage { family } => {
            let matrix = session
                .coverage(family)
                .await
                .context("Coverage fetch failed")?;
            print_json(&matrix)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{rendered}");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {:?}", e);
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
                error!("Failed to install signal handler: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
