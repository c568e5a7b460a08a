//! Runner Factory
//!
//! Maps a step type to the runner that executes it. Every arm validates the
//! raw arguments before a runner exists, so invalid input never reaches
//! `Runner::run`.

use async_trait::async_trait;
use std::sync::Arc;

use crate::agent::params::WorkerConfig;
use crate::connection::protocol::StepType;
use crate::runtime::adapter::{Runner, RunnerResult, StepError};
use crate::runtime::steps::{
    ConnectivityCheckRunner, DiskSpeedCheckRunner, DomainResolutionRunner, FreeAddressesRunner,
    ImageAvailabilityRunner, InstallRunner, InventoryRunner, LogsGatherRunner,
    NtpSynchronizerRunner, StopInstallationRunner,
};

/// A constructed runner, one variant per step type
pub enum StepRunner {
    Inventory(InventoryRunner),
    ConnectivityCheck(ConnectivityCheckRunner),
    FreeNetworkAddresses(FreeAddressesRunner),
    NtpSynchronizer(NtpSynchronizerRunner),
    DiskSpeedCheck(DiskSpeedCheckRunner),
    DomainResolution(DomainResolutionRunner),
    ContainerImageAvailability(ImageAvailabilityRunner),
    Install(InstallRunner),
    StopInstallation(StopInstallationRunner),
    LogsGather(LogsGatherRunner),
}

impl StepRunner {
    pub fn step_type(&self) -> StepType {
        match self {
            StepRunner::Inventory(_) => StepType::Inventory,
            StepRunner::ConnectivityCheck(_) => StepType::ConnectivityCheck,
            StepRunner::FreeNetworkAddresses(_) => StepType::FreeNetworkAddresses,
            StepRunner::NtpSynchronizer(_) => StepType::NtpSynchronizer,
            StepRunner::DiskSpeedCheck(_) => StepType::DiskSpeedCheck,
            StepRunner::DomainResolution(_) => StepType::DomainResolution,
            StepRunner::ContainerImageAvailability(_) => StepType::ContainerImageAvailability,
            StepRunner::Install(_) => StepType::Install,
            StepRunner::StopInstallation(_) => StepType::StopInstallation,
            StepRunner::LogsGather(_) => StepType::LogsGather,
        }
    }

    fn as_runner(&self) -> &dyn Runner {
        match self {
            StepRunner::Inventory(r) => r,
            StepRunner::ConnectivityCheck(r) => r,
            StepRunner::FreeNetworkAddresses(r) => r,
            StepRunner::NtpSynchronizer(r) => r,
            StepRunner::DiskSpeedCheck(r) => r,
            StepRunner::DomainResolution(r) => r,
            StepRunner::ContainerImageAvailability(r) => r,
            StepRunner::Install(r) => r,
            StepRunner::StopInstallation(r) => r,
            StepRunner::LogsGather(r) => r,
        }
    }
}

#[async_trait]
impl Runner for StepRunner {
    fn command(&self) -> &str {
        self.as_runner().command()
    }

    fn args(&self) -> &[String] {
        self.as_runner().args()
    }

    async fn run(&self) -> RunnerResult {
        self.as_runner().run().await
    }
}

/// Builds runners for one agent
#[derive(Clone)]
pub struct RunnerFactory {
    config: Arc<WorkerConfig>,
}

impl RunnerFactory {
    pub fn new(config: Arc<WorkerConfig>) -> Self {
        Self { config }
    }

    /// Validate `args` for `step_type` and construct its runner
    pub fn create(&self, step_type: StepType, args: Vec<String>) -> Result<StepRunner, StepError> {
        let config = self.config.clone();
        let runner = match step_type {
            StepType::Inventory => StepRunner::Inventory(InventoryRunner::new(config, args)?),
            StepType::ConnectivityCheck => {
                StepRunner::ConnectivityCheck(ConnectivityCheckRunner::new(config, args)?)
            }
            StepType::FreeNetworkAddresses => {
                StepRunner::FreeNetworkAddresses(FreeAddressesRunner::new(args)?)
            }
            StepType::NtpSynchronizer => StepRunner::NtpSynchronizer(NtpSynchronizerRunner::new()),
            StepType::DiskSpeedCheck => StepRunner::DiskSpeedCheck(DiskSpeedCheckRunner::new(args)?),
            StepType::DomainResolution => {
                StepRunner::DomainResolution(DomainResolutionRunner::new(config, args)?)
            }
            StepType::ContainerImageAvailability => {
                StepRunner::ContainerImageAvailability(ImageAvailabilityRunner::new(config, args)?)
            }
            StepType::Install => StepRunner::Install(InstallRunner::new(config, args)?),
            StepType::StopInstallation => StepRunner::StopInstallation(StopInstallationRunner::new()),
            StepType::LogsGather => StepRunner::LogsGather(LogsGatherRunner::new(config, args)?),
        };
        Ok(runner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::steps::testing::{args, worker_config};

    #[test]
    fn test_commands_per_step_type() {
        let factory = RunnerFactory::new(worker_config(None));
        let cases = [
            (StepType::Inventory, args(&["11111111-1111-1111-1111-111111111111"]), "inventory"),
            (StepType::FreeNetworkAddresses, args(&[r#"["10.0.0.0/24"]"#]), "free_addresses"),
            (StepType::NtpSynchronizer, args(&["ignored"]), "ntp-synchronizer"),
            (StepType::DiskSpeedCheck, args(&[r#"{"path": "/dev/sda"}"#, "3"]), "disk_speed_check"),
            (StepType::ContainerImageAvailability, args(&[r#"{"images": ["a/b:c"]}"#]), "sh"),
            (StepType::StopInstallation, args(&[]), "stop_installation"),
        ];

        for (step_type, raw, command) in cases {
            let runner = factory.create(step_type, raw).unwrap();
            assert_eq!(runner.step_type(), step_type);
            assert_eq!(runner.command(), command);
        }
    }

    #[test]
    fn test_argument_free_runners_report_no_args() {
        let factory = RunnerFactory::new(worker_config(None));
        let ntp = factory.create(StepType::NtpSynchronizer, args(&["x", "y"])).unwrap();
        assert!(ntp.args().is_empty());
    }

    #[test]
    fn test_validation_failure_never_builds_runner() {
        let factory = RunnerFactory::new(worker_config(None));
        let err = factory
            .create(StepType::DiskSpeedCheck, args(&[r#"{"path": "/dev/sda"}"#, "abc"]))
            .err()
            .unwrap();
        assert!(matches!(err, StepError::Validation(_)));
    }

    #[tokio::test]
    async fn test_runs_through_enum() {
        let factory = RunnerFactory::new(worker_config(None));
        let runner = factory.create(StepType::NtpSynchronizer, vec![]).unwrap();
        let result = runner.run().await;
        assert_eq!(result.stdout, r#"{"ntp_sources": []}"#);
    }
}
