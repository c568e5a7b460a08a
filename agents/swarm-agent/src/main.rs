//! Swarm Agent CLI Entry Point
//!
//! This is the main entry point for the swarm-agent binary.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use swarm_agent::api;
use swarm_agent::cli::config::{Config, LoggingConfig};
use swarm_agent::connection::controller::HttpConnector;
use swarm_agent::Swarm;

#[derive(Parser)]
#[command(name = "swarm-agent")]
#[command(author, version, about = "Swarm Agent - Runs many simulated installation agents in one process")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/swarm.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST server
    Serve {
        /// Address to bind, overrides the config file
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overrides the config file
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective configuration
    PrintConfig,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            init_logging(&config.logging, cli.verbose)?;
            serve(config).await?;
        }
        Commands::PrintConfig => {
            let content =
                toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
            print!("{content}");
        }
        Commands::Version => {
            show_version();
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match logging.format.as_str() {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };
    result.map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

async fn serve(config: Config) -> Result<()> {
    let connector = HttpConnector::new(config.agent.controller_timeout());
    let swarm = Arc::new(Swarm::new(Arc::new(connector), config.agent.settings()));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(address = %address, "Swarm agent listening");

    axum::serve(listener, api::router(swarm))
        .await
        .context("Server error")?;

    Ok(())
}

fn show_version() {
    println!("swarm-agent {}", env!("CARGO_PKG_VERSION"));
    println!("Simulated installation agents for swarm-scale testing");
}
