use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::agent::params::WorkerConfig;
use crate::runtime::adapter::{Runner, RunnerResult, StepError};
use crate::runtime::validate::decode_request;

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectivityCheckNic {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectivityCheckHost {
    pub host_id: Uuid,
    #[serde(default)]
    pub nics: Vec<ConnectivityCheckNic>,
}

/// Checks L2/L3 connectivity towards the other hosts of the cluster
pub struct ConnectivityCheckRunner {
    args: Vec<String>,
    hosts: Vec<ConnectivityCheckHost>,
    config: Arc<WorkerConfig>,
}

impl ConnectivityCheckRunner {
    pub fn new(config: Arc<WorkerConfig>, args: Vec<String>) -> Result<Self, StepError> {
        let hosts: Vec<ConnectivityCheckHost> = decode_request("connectivity check", 1, &args)?;
        Ok(Self { args, hosts, config })
    }
}

#[async_trait]
impl Runner for ConnectivityCheckRunner {
    fn command(&self) -> &str {
        "connectivity_check"
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    async fn run(&self) -> RunnerResult {
        let local_ip = self
            .config
            .dry_run
            .forced_host_ipv4
            .as_deref()
            .and_then(|cidr| cidr.split('/').next())
            .unwrap_or_default()
            .to_string();

        let remote_hosts: Vec<_> = self
            .hosts
            .iter()
            .map(|host| {
                let l2: Vec<_> = host
                    .nics
                    .iter()
                    .map(|nic| {
                        json!({
                            "outgoing_nic": "eth0",
                            "remote_mac": nic.mac,
                            "remote_ip_address": nic.ip_addresses.first().cloned().unwrap_or_default(),
                            "outgoing_ip_address": local_ip,
                            "successful": true
                        })
                    })
                    .collect();
                let l3: Vec<_> = host
                    .nics
                    .iter()
                    .flat_map(|nic| nic.ip_addresses.iter())
                    .map(|ip| {
                        json!({
                            "outgoing_nic": "eth0",
                            "remote_ip_address": ip.split('/').next().unwrap_or(ip),
                            "successful": true,
                            "average_rtt_ms": 0.5,
                            "packet_loss_percentage": 0
                        })
                    })
                    .collect();
                json!({
                    "host_id": host.host_id,
                    "l2_connectivity": l2,
                    "l3_connectivity": l3
                })
            })
            .collect();

        RunnerResult::success(json!({ "remote_hosts": remote_hosts }).to_string())
    }
}
