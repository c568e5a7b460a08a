use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::agent::params::WorkerConfig;
use crate::runtime::adapter::{Runner, RunnerResult, StepError};
use crate::runtime::validate::check_arity;

/// Reports the simulated host's hardware inventory
pub struct InventoryRunner {
    args: Vec<String>,
    config: Arc<WorkerConfig>,
}

impl InventoryRunner {
    pub fn new(config: Arc<WorkerConfig>, args: Vec<String>) -> Result<Self, StepError> {
        check_arity("inventory", 1, &args)?;
        if Uuid::parse_str(&args[0]).is_err() {
            return Err(StepError::Validation(format!(
                "inventory cmd accepts only 1 params in args and it should be UUID, given args {args:?}"
            )));
        }
        Ok(Self { args, config })
    }
}

#[async_trait]
impl Runner for InventoryRunner {
    fn command(&self) -> &str {
        "inventory"
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    async fn run(&self) -> RunnerResult {
        let dry_run = &self.config.dry_run;
        let ipv4: Vec<&str> = dry_run.forced_host_ipv4.as_deref().into_iter().collect();

        let inventory = json!({
            "hostname": dry_run.hostname(),
            "bmc_address": "0.0.0.0",
            "cpu": { "architecture": "x86_64", "count": 8, "model_name": "Swarm Virtual CPU" },
            "memory": { "physical_bytes": 17_179_869_184u64, "usable_bytes": 16_106_127_360u64 },
            "disks": [{
                "name": "sda",
                "path": "/dev/sda",
                "drive_type": "SSD",
                "size_bytes": 128_849_018_880u64,
                "installation_eligibility": { "eligible": true, "not_eligible_reasons": [] }
            }],
            "interfaces": [{
                "name": "eth0",
                "mac_address": dry_run.forced_mac_address.clone().unwrap_or_default(),
                "ipv4_addresses": ipv4,
                "ipv6_addresses": [],
                "mtu": 1500,
                "speed_mbps": 10000
            }],
            "system_vendor": {
                "manufacturer": "Assisted Swarm",
                "product_name": "dry-run",
                "serial_number": dry_run.forced_host_id.to_string(),
                "virtual": true
            },
            "timestamp": chrono::Utc::now().timestamp()
        });

        RunnerResult::success(inventory.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::steps::testing::{args, worker_config};

    #[test]
    fn test_requires_uuid_argument() {
        assert!(InventoryRunner::new(worker_config(None), args(&["not-a-uuid"])).is_err());
        assert!(InventoryRunner::new(worker_config(None), args(&[])).is_err());
        assert!(InventoryRunner::new(
            worker_config(None),
            args(&["11111111-1111-1111-1111-111111111111"])
        )
        .is_ok());
    }

    #[tokio::test]
    async fn test_reports_forced_identity() {
        let runner = InventoryRunner::new(
            worker_config(None),
            args(&["11111111-1111-1111-1111-111111111111"]),
        )
        .unwrap();

        let result = runner.run().await;
        assert!(result.is_success());

        let inventory: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
        assert_eq!(inventory["hostname"], "master-0");
        assert_eq!(inventory["interfaces"][0]["mac_address"], "52:54:00:aa:bb:cc");
        assert_eq!(inventory["interfaces"][0]["ipv4_addresses"][0], "192.168.126.10/24");
    }
}
