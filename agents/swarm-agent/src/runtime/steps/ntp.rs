use async_trait::async_trait;

use crate::runtime::adapter::{Runner, RunnerResult};

/// NTP synchronisation is a no-op on simulated hosts
#[derive(Debug, Default)]
pub struct NtpSynchronizerRunner;

impl NtpSynchronizerRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for NtpSynchronizerRunner {
    fn command(&self) -> &str {
        "ntp-synchronizer"
    }

    fn args(&self) -> &[String] {
        &[]
    }

    async fn run(&self) -> RunnerResult {
        RunnerResult::success(r#"{"ntp_sources": []}"#)
    }
}
