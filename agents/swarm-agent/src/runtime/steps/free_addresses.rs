use async_trait::async_trait;
use serde_json::json;

use crate::runtime::adapter::{Runner, RunnerResult, StepError};
use crate::runtime::validate::{decode_request, is_ipv4_cidr};

/// Scans the requested networks for unused addresses
pub struct FreeAddressesRunner {
    args: Vec<String>,
    networks: Vec<String>,
}

impl FreeAddressesRunner {
    pub fn new(args: Vec<String>) -> Result<Self, StepError> {
        let networks: Vec<String> = decode_request("free addresses", 1, &args)?;
        if let Some(bad) = networks.iter().find(|n| !is_ipv4_cidr(n)) {
            return Err(StepError::Validation(format!(
                "free addresses: {bad} is not an IPv4 CIDR"
            )));
        }
        Ok(Self { args, networks })
    }
}

#[async_trait]
impl Runner for FreeAddressesRunner {
    fn command(&self) -> &str {
        "free_addresses"
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    async fn run(&self) -> RunnerResult {
        // Simulated networks are fully occupied by other swarm members.
        let report: Vec<_> = self
            .networks
            .iter()
            .map(|network| json!({ "network": network, "free_addresses": [] }))
            .collect();
        RunnerResult::success(serde_json::Value::from(report).to_string())
    }
}
