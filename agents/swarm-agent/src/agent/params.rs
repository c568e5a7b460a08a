//! Agent Parameters
//!
//! Request parameters for creating a simulated agent, and the worker
//! configuration bundle built from them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::error::SwarmError;
use crate::runtime::validate::{is_ipv4_cidr, is_mac_address};

/// Parameters accepted when creating a new agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAgentParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_env_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cacert: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers_conf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers_storage_conf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_forced_host_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_forced_host_ipv4: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_forced_mac_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_forced_hostname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_cluster_hosts_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_fake_reboot_marker_path: Option<String>,
}

/// Empty strings count as unset
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_uuid_field(field: &str, value: Option<&str>) -> Result<Option<Uuid>, SwarmError> {
    value
        .map(|v| {
            Uuid::parse_str(v).map_err(|_| {
                SwarmError::Validation(format!("{field} in body must be of type uuid: \"{v}\""))
            })
        })
        .transpose()
}

impl NewAgentParams {
    /// Check field formats
    pub fn validate(&self) -> Result<(), SwarmError> {
        parse_uuid_field("dry_forced_host_id", present(&self.dry_forced_host_id))?;
        parse_uuid_field("infra_env_id", present(&self.infra_env_id))?;

        if let Some(ipv4) = present(&self.dry_forced_host_ipv4) {
            if !is_ipv4_cidr(ipv4) {
                return Err(SwarmError::Validation(format!(
                    "dry_forced_host_ipv4 in body should match an IPv4 CIDR: \"{ipv4}\""
                )));
            }
        }

        if let Some(mac) = present(&self.dry_forced_mac_address) {
            if !is_mac_address(mac) {
                return Err(SwarmError::Validation(format!(
                    "dry_forced_mac_address in body must be of type mac: \"{mac}\""
                )));
            }
        }

        Ok(())
    }
}

/// One host of the simulated cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHost {
    pub hostname: String,
    pub ip: String,
    #[serde(default)]
    pub reboot_marker_path: String,
}

/// Read the simulated cluster hosts file
pub fn parse_cluster_hosts(path: &str) -> Result<Vec<ClusterHost>, SwarmError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SwarmError::Validation(format!("failed to read cluster hosts file '{path}': {e}"))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        SwarmError::Validation(format!("failed to parse cluster hosts file '{path}': {e}"))
    })
}

/// Dry-run identity and simulation knobs
#[derive(Debug, Clone)]
pub struct DryRunConfig {
    pub forced_host_id: Uuid,
    pub forced_mac_address: Option<String>,
    pub forced_host_ipv4: Option<String>,
    pub forced_hostname: Option<String>,
    pub fake_reboot_marker_path: Option<PathBuf>,
    pub cluster_hosts: Vec<ClusterHost>,
}

impl DryRunConfig {
    /// Hostname reported by the simulated host
    pub fn hostname(&self) -> String {
        self.forced_hostname.clone().unwrap_or_else(|| {
            hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string())
        })
    }

    pub fn reboot_marker(&self) -> Option<&Path> {
        self.fake_reboot_marker_path.as_deref()
    }
}

/// How the agent reaches the installation service
#[derive(Debug, Clone)]
pub struct ConnectivityConfig {
    pub target_url: Option<String>,
    pub infra_env_id: Option<Uuid>,
    pub agent_version: String,
    pub pull_secret_token: Option<String>,
    pub ca_cert_path: Option<PathBuf>,
    pub insecure_connection: bool,
}

/// Container tooling configuration handed to subprocess-backed steps
#[derive(Debug, Clone, Default)]
pub struct ContainersConfig {
    pub conf: Option<PathBuf>,
    pub storage_conf: Option<PathBuf>,
}

/// Configuration bundle for one simulated agent
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub dry_run: DryRunConfig,
    pub connectivity: ConnectivityConfig,
    pub containers: ContainersConfig,
    pub instruction_interval: Duration,
}

impl WorkerConfig {
    /// Validate the request and build the worker configuration
    ///
    /// The cluster hosts file is parsed eagerly so a bad path rejects the
    /// request before any agent exists.
    pub fn from_params(
        params: &NewAgentParams,
        instruction_interval: Duration,
    ) -> Result<Self, SwarmError> {
        params.validate()?;

        let forced_host_id = parse_uuid_field("dry_forced_host_id", present(&params.dry_forced_host_id))?
            .unwrap_or_else(Uuid::new_v4);
        let infra_env_id = parse_uuid_field("infra_env_id", present(&params.infra_env_id))?;

        let hosts_path = present(&params.dry_cluster_hosts_path).unwrap_or_default();
        let cluster_hosts = parse_cluster_hosts(hosts_path)?;

        let owned = |v: &Option<String>| present(v).map(str::to_string);

        Ok(Self {
            dry_run: DryRunConfig {
                forced_host_id,
                forced_mac_address: owned(&params.dry_forced_mac_address),
                forced_host_ipv4: owned(&params.dry_forced_host_ipv4),
                forced_hostname: owned(&params.dry_forced_hostname),
                fake_reboot_marker_path: present(&params.dry_fake_reboot_marker_path)
                    .map(PathBuf::from),
                cluster_hosts,
            },
            connectivity: ConnectivityConfig {
                target_url: owned(&params.service_url),
                infra_env_id,
                agent_version: owned(&params.agent_version).unwrap_or_default(),
                pull_secret_token: owned(&params.pull_secret),
                ca_cert_path: present(&params.cacert).map(PathBuf::from),
                insecure_connection: true,
            },
            containers: ContainersConfig {
                conf: present(&params.containers_conf).map(PathBuf::from),
                storage_conf: present(&params.containers_storage_conf).map(PathBuf::from),
            },
            instruction_interval,
        })
    }

    pub fn host_id(&self) -> Uuid {
        self.dry_run.forced_host_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn hosts_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"hostname": "master-0", "ip": "192.168.126.10", "reboot_marker_path": "/tmp/m0"}}]"#
        )
        .unwrap();
        file
    }

    fn params_with_hosts(path: &str) -> NewAgentParams {
        NewAgentParams {
            service_url: Some("http://127.0.0.1:8090".to_string()),
            infra_env_id: Some("22222222-2222-2222-2222-222222222222".to_string()),
            dry_forced_host_id: Some("11111111-1111-1111-1111-111111111111".to_string()),
            dry_forced_host_ipv4: Some("192.168.126.10/24".to_string()),
            dry_forced_mac_address: Some("52:54:00:aa:bb:cc".to_string()),
            dry_forced_hostname: Some("master-0".to_string()),
            dry_cluster_hosts_path: Some(path.to_string()),
            dry_fake_reboot_marker_path: Some("/tmp/swarm/reboot".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_worker_config_from_params() {
        let hosts = hosts_file();
        let params = params_with_hosts(hosts.path().to_str().unwrap());

        let config = WorkerConfig::from_params(&params, Duration::from_secs(60)).unwrap();
        assert_eq!(
            config.host_id().to_string(),
            "11111111-1111-1111-1111-111111111111"
        );
        assert_eq!(config.dry_run.cluster_hosts.len(), 1);
        assert_eq!(config.dry_run.cluster_hosts[0].hostname, "master-0");
        assert_eq!(config.dry_run.hostname(), "master-0");
        assert_eq!(
            config.dry_run.reboot_marker(),
            Some(Path::new("/tmp/swarm/reboot"))
        );
        assert!(config.connectivity.insecure_connection);
        assert_eq!(config.instruction_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_hosts_file_is_rejected() {
        let params = params_with_hosts("/nonexistent/hosts.json");
        let err = WorkerConfig::from_params(&params, Duration::from_secs(60)).unwrap_err();
        match err {
            SwarmError::Validation(reason) => {
                assert!(reason.contains("failed to read cluster hosts file"))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_hosts_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let params = params_with_hosts(file.path().to_str().unwrap());
        let err = WorkerConfig::from_params(&params, Duration::from_secs(60)).unwrap_err();
        assert!(err.to_string().contains("failed to parse cluster hosts file"));
    }

    #[test]
    fn test_field_formats() {
        let mut params = NewAgentParams {
            dry_forced_host_id: Some("not-a-uuid".to_string()),
            ..Default::default()
        };
        assert!(params.validate().is_err());

        params.dry_forced_host_id = Some(String::new());
        assert!(params.validate().is_ok());

        params.dry_forced_host_ipv4 = Some("192.168.126.10".to_string());
        assert!(params.validate().is_err());

        params.dry_forced_host_ipv4 = None;
        params.dry_forced_mac_address = Some("52:54:00".to_string());
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_host_id_generated_when_not_forced() {
        let hosts = hosts_file();
        let mut params = params_with_hosts(hosts.path().to_str().unwrap());
        params.dry_forced_host_id = None;

        let config = WorkerConfig::from_params(&params, Duration::from_secs(60)).unwrap();
        assert!(!config.host_id().is_nil());
    }
}
