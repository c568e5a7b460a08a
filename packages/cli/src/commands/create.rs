use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use crate::api::{Agent, ApiClient};

/// Create-agent request body
#[derive(Debug, Default, Serialize)]
pub struct CreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infra_env_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cacert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_forced_host_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_forced_mac_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_forced_host_ipv4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_forced_hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_cluster_hosts_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_fake_reboot_marker_path: Option<String>,
}

/// Read the pull secret from a file, trimming the trailing newline
pub fn read_pull_secret(path: &PathBuf) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pull secret at {}", path.display()))?;
    Ok(content.trim().to_string())
}

/// Create an agent
pub async fn run(api_url: Option<String>, request: CreateRequest) -> Result<()> {
    let api = ApiClient::from_config(api_url)?;
    let agent: Agent = api.post("/agents", &request).await?;

    println!(
        "{} Agent {} created ({})",
        "✓".green().bold(),
        agent.id.to_string().bold(),
        agent.status.green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_request_omits_unset_fields() {
        let request = CreateRequest {
            dry_forced_host_id: Some("11111111-1111-1111-1111-111111111111".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_read_pull_secret() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "secret-token").unwrap();
        let secret = read_pull_secret(&file.path().to_path_buf()).unwrap();
        assert_eq!(secret, "secret-token");
    }
}
