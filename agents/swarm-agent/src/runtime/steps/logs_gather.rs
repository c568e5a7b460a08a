use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::agent::params::WorkerConfig;
use crate::runtime::adapter::{Runner, RunnerResult, StepError};
use crate::runtime::validate::decode_request;

#[derive(Debug, Clone, Deserialize)]
pub struct LogsGatherCmdRequest {
    pub cluster_id: Uuid,
    pub host_id: Uuid,
    pub infra_env_id: Uuid,
    pub bootstrap: bool,
    #[serde(default)]
    pub installer_gather: bool,
    #[serde(default)]
    pub master_ips: Vec<String>,
}

/// Simulates gathering host logs for the installation service
///
/// Nothing is uploaded; the reply only describes what a real host would
/// have collected.
pub struct LogsGatherRunner {
    args: Vec<String>,
    request: LogsGatherCmdRequest,
    config: Arc<WorkerConfig>,
}

impl LogsGatherRunner {
    pub fn new(config: Arc<WorkerConfig>, args: Vec<String>) -> Result<Self, StepError> {
        let request: LogsGatherCmdRequest = decode_request("logs gather", 1, &args)?;
        Ok(Self {
            args,
            request,
            config,
        })
    }
}

#[async_trait]
impl Runner for LogsGatherRunner {
    fn command(&self) -> &str {
        "logs_sender"
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    async fn run(&self) -> RunnerResult {
        let Some(target) = self.config.connectivity.target_url.as_deref() else {
            return RunnerResult::failure("no service url configured to send logs to");
        };

        info!(
            cluster_id = %self.request.cluster_id,
            host_id = %self.request.host_id,
            bootstrap = self.request.bootstrap,
            target = %target,
            "Simulating logs gather"
        );

        let report = json!({
            "cluster_id": self.request.cluster_id,
            "host_id": self.request.host_id,
            "infra_env_id": self.request.infra_env_id,
            "bootstrap": self.request.bootstrap,
            "installer_gather": self.request.installer_gather,
            "masters_ips": self.request.master_ips.join(","),
        });
        RunnerResult::success(report.to_string())
    }
}
