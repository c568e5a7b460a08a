use async_trait::async_trait;
use tracing::info;

use crate::runtime::adapter::{Runner, RunnerResult};

#[derive(Debug, Default)]
pub struct StopInstallationRunner;

impl StopInstallationRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for StopInstallationRunner {
    fn command(&self) -> &str {
        "stop_installation"
    }

    fn args(&self) -> &[String] {
        &[]
    }

    async fn run(&self) -> RunnerResult {
        info!("Stop installation requested, nothing to stop on a simulated host");
        RunnerResult::success("")
    }
}
