use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;

/// Ask the swarm process to terminate
pub async fn exit(api_url: Option<String>) -> Result<()> {
    let api = ApiClient::from_config(api_url)?;
    api.post_empty("/exit").await?;

    println!("{} Swarm agent is shutting down", "✓".green().bold());
    Ok(())
}

/// Check that the swarm process is alive
pub async fn health(api_url: Option<String>) -> Result<()> {
    let api = ApiClient::from_config(api_url)?;
    api.get_empty("/health").await?;

    println!("{} Swarm agent is healthy", "✓".green().bold());
    Ok(())
}
