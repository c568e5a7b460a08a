//! Step Protocol
//!
//! Defines the message types exchanged between a simulated agent and the
//! installation service that hands out its steps.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::runtime::adapter::{RunnerResult, StepError};

/// Kinds of steps the controller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepType {
    Inventory,
    ConnectivityCheck,
    FreeNetworkAddresses,
    NtpSynchronizer,
    DiskSpeedCheck,
    DomainResolution,
    ContainerImageAvailability,
    Install,
    StopInstallation,
    LogsGather,
}

impl StepType {
    pub const ALL: [StepType; 10] = [
        StepType::Inventory,
        StepType::ConnectivityCheck,
        StepType::FreeNetworkAddresses,
        StepType::NtpSynchronizer,
        StepType::DiskSpeedCheck,
        StepType::DomainResolution,
        StepType::ContainerImageAvailability,
        StepType::Install,
        StepType::StopInstallation,
        StepType::LogsGather,
    ];

    /// Wire name used by the controller
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Inventory => "inventory",
            StepType::ConnectivityCheck => "connectivity-check",
            StepType::FreeNetworkAddresses => "free-network-addresses",
            StepType::NtpSynchronizer => "ntp-synchronizer",
            StepType::DiskSpeedCheck => "installation-disk-speed-check",
            StepType::DomainResolution => "domain-resolution",
            StepType::ContainerImageAvailability => "container-image-availability",
            StepType::Install => "install",
            StepType::StopInstallation => "stop-installation",
            StepType::LogsGather => "logs-gather",
        }
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepType {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| StepError::UnknownStepType(s.to_string()))
    }
}

/// One unit of work requested by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub step_id: String,
    pub step_type: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Step {
    /// Resolve the wire step type into a known kind
    pub fn kind(&self) -> Result<StepType, StepError> {
        self.step_type.parse()
    }
}

/// What the agent should do after running the current batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStepAction {
    #[default]
    Continue,
    Exit,
}

/// A batch of steps returned by the controller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Steps {
    #[serde(default)]
    pub instructions: Vec<Step>,
    #[serde(default)]
    pub next_instruction_seconds: Option<u64>,
    #[serde(default)]
    pub post_step_action: PostStepAction,
}

/// Result of one step, reported back to the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReply {
    pub step_id: String,
    pub step_type: String,
    pub output: String,
    pub error: String,
    pub exit_code: i64,
}

impl StepReply {
    /// Reply carrying a runner's result
    pub fn from_result(step: &Step, result: RunnerResult) -> Self {
        Self {
            step_id: step.step_id.clone(),
            step_type: step.step_type.clone(),
            output: result.stdout,
            error: result.stderr,
            exit_code: result.exit_code,
        }
    }

    /// Reply for a step that never reached execution
    pub fn rejected(step: &Step, error: &StepError) -> Self {
        Self::from_result(step, RunnerResult::failure(error.to_string()))
    }
}

/// Host registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRegistration {
    pub host_id: Uuid,
    pub discovery_agent_version: String,
}

impl Steps {
    /// Deserialize a batch from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_type_wire_names() {
        for kind in StepType::ALL {
            assert_eq!(kind.as_str().parse::<StepType>().unwrap(), kind);
        }
        assert_eq!(
            "installation-disk-speed-check".parse::<StepType>().unwrap(),
            StepType::DiskSpeedCheck
        );
    }

    #[test]
    fn test_unknown_step_type() {
        let step = Step {
            step_id: "s-1".to_string(),
            step_type: "tang-connectivity-check".to_string(),
            args: vec![],
        };
        assert_eq!(
            step.kind(),
            Err(StepError::UnknownStepType("tang-connectivity-check".to_string()))
        );
    }

    #[test]
    fn test_steps_deserialization() {
        let json = r#"{
            "instructions": [
                {"step_id": "inventory-1a2b", "step_type": "inventory", "args": ["11111111-1111-1111-1111-111111111111"]},
                {"step_id": "ntp-3c4d", "step_type": "ntp-synchronizer"}
            ],
            "next_instruction_seconds": 30,
            "post_step_action": "continue"
        }"#;

        let steps = Steps::from_json(json).unwrap();
        assert_eq!(steps.instructions.len(), 2);
        assert_eq!(steps.instructions[0].kind().unwrap(), StepType::Inventory);
        assert!(steps.instructions[1].args.is_empty());
        assert_eq!(steps.next_instruction_seconds, Some(30));
        assert_eq!(steps.post_step_action, PostStepAction::Continue);
    }

    #[test]
    fn test_exit_action_and_defaults() {
        let steps = Steps::from_json(r#"{"post_step_action": "exit"}"#).unwrap();
        assert!(steps.instructions.is_empty());
        assert_eq!(steps.post_step_action, PostStepAction::Exit);
    }

    #[test]
    fn test_rejected_reply() {
        let step = Step {
            step_id: "x".to_string(),
            step_type: "bogus".to_string(),
            args: vec![],
        };
        let reply = StepReply::rejected(&step, &StepError::UnknownStepType("bogus".into()));
        assert_eq!(reply.exit_code, -1);
        assert_eq!(reply.error, "unexpected step type bogus");
        assert!(reply.output.is_empty());
    }
}
