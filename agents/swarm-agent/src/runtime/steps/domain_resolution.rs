use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::agent::params::WorkerConfig;
use crate::runtime::adapter::{Runner, RunnerResult, StepError};
use crate::runtime::validate::{decode_request, require};

#[derive(Debug, Clone, Deserialize)]
pub struct DomainName {
    #[serde(default)]
    pub domain_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainResolutionRequest {
    pub domains: Vec<DomainName>,
}

/// Resolves cluster domain names
///
/// Names are answered from the simulated cluster hosts file; anything else
/// resolves to no addresses.
pub struct DomainResolutionRunner {
    args: Vec<String>,
    request: DomainResolutionRequest,
    config: Arc<WorkerConfig>,
}

impl DomainResolutionRunner {
    pub fn new(config: Arc<WorkerConfig>, args: Vec<String>) -> Result<Self, StepError> {
        let request: DomainResolutionRequest = decode_request("domain resolution", 1, &args)?;
        for domain in &request.domains {
            require("domain resolution", "domain_name", &domain.domain_name)?;
        }
        Ok(Self {
            args,
            request,
            config,
        })
    }
}

#[async_trait]
impl Runner for DomainResolutionRunner {
    fn command(&self) -> &str {
        "domain_resolution"
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    async fn run(&self) -> RunnerResult {
        let hosts = &self.config.dry_run.cluster_hosts;
        let resolutions: Vec<_> = self
            .request
            .domains
            .iter()
            .map(|domain| {
                let addresses: Vec<&str> = hosts
                    .iter()
                    .filter(|h| h.hostname == domain.domain_name)
                    .map(|h| h.ip.as_str())
                    .collect();
                json!({
                    "domain_name": domain.domain_name,
                    "ipv4_addresses": addresses,
                    "ipv6_addresses": []
                })
            })
            .collect();

        RunnerResult::success(json!({ "resolutions": resolutions }).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::steps::testing::{args, worker_config};

    #[test]
    fn test_rejects_empty_domain_name() {
        let request = r#"{"domains": [{"domain_name": ""}]}"#;
        assert!(DomainResolutionRunner::new(worker_config(None), args(&[request])).is_err());
        assert!(DomainResolutionRunner::new(worker_config(None), args(&["{}"])).is_err());
    }

    #[tokio::test]
    async fn test_resolves_cluster_hosts() {
        let request = r#"{"domains": [{"domain_name": "master-1"}, {"domain_name": "api.example.com"}]}"#;
        let runner = DomainResolutionRunner::new(worker_config(None), args(&[request])).unwrap();

        let result = runner.run().await;
        let report: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
        assert_eq!(report["resolutions"][0]["ipv4_addresses"][0], "192.168.126.11");
        assert!(report["resolutions"][1]["ipv4_addresses"]
            .as_array()
            .unwrap()
            .is_empty());
    }
}
