use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod api;
mod commands;
mod config;

use commands::create::{read_pull_secret, CreateRequest};

#[derive(Parser)]
#[command(name = "swarmctl", about = "Swarm CLI - Manage simulated agents of a swarm agent process")]
#[command(version, propagate_version = true)]
struct Cli {
    /// API base URL, overrides the saved config
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a simulated agent
    Create(CreateArgs),

    /// List agents
    List,

    /// Show one agent
    Get {
        /// Agent ID
        id: i64,
    },

    /// Delete an agent's record
    Delete {
        /// Agent ID
        id: i64,
    },

    /// Terminate the swarm agent process
    Exit,

    /// Check the swarm agent is alive
    Health,

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args)]
struct CreateArgs {
    /// Installation service URL
    #[arg(long)]
    service_url: Option<String>,

    /// Infra-env ID
    #[arg(long)]
    infra_env_id: Option<String>,

    /// Agent version reported on registration
    #[arg(long)]
    agent_version: Option<String>,

    /// File holding the pull secret
    #[arg(long)]
    pull_secret_file: Option<PathBuf>,

    /// CA certificate path on the swarm host
    #[arg(long)]
    cacert: Option<String>,

    /// Forced host ID
    #[arg(long)]
    host_id: Option<String>,

    /// Forced MAC address
    #[arg(long)]
    mac: Option<String>,

    /// Forced IPv4 address in CIDR form
    #[arg(long)]
    ipv4: Option<String>,

    /// Forced hostname
    #[arg(long)]
    hostname: Option<String>,

    /// Cluster hosts JSON file on the swarm host
    #[arg(long)]
    hosts_file: Option<String>,

    /// Reboot marker path on the swarm host
    #[arg(long)]
    reboot_marker: Option<String>,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Save the API base URL
    SetUrl {
        /// API base URL
        url: String,
    },

    /// Show the effective configuration
    Show,
}

impl CreateArgs {
    fn into_request(self) -> Result<CreateRequest> {
        let pull_secret = self
            .pull_secret_file
            .as_ref()
            .map(read_pull_secret)
            .transpose()?;

        Ok(CreateRequest {
            service_url: self.service_url,
            infra_env_id: self.infra_env_id,
            agent_version: self.agent_version,
            pull_secret,
            cacert: self.cacert,
            dry_forced_host_id: self.host_id,
            dry_forced_mac_address: self.mac,
            dry_forced_host_ipv4: self.ipv4,
            dry_forced_hostname: self.hostname,
            dry_cluster_hosts_path: self.hosts_file,
            dry_fake_reboot_marker_path: self.reboot_marker,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api_url = cli.api_url;

    match cli.command {
        Commands::Create(args) => commands::create::run(api_url, args.into_request()?).await,
        Commands::List => commands::agents::list(api_url).await,
        Commands::Get { id } => commands::agents::get(api_url, id).await,
        Commands::Delete { id } => commands::agents::delete(api_url, id).await,
        Commands::Exit => commands::process::exit(api_url).await,
        Commands::Health => commands::process::health(api_url).await,
        Commands::Config { command } => match command {
            ConfigCommands::SetUrl { url } => commands::config::set_url(url),
            ConfigCommands::Show => commands::config::show(),
        },
    }
}
