//! Runner Trait
//!
//! Defines the uniform interface every step handler implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of exactly one runner invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
}

impl RunnerResult {
    /// A successful run with the given output
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// A failed run with the given error output
    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: -1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors raised while turning a step into a runner
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StepError {
    /// Step arguments failed validation; the step is never executed
    #[error("{0}")]
    Validation(String),

    /// The step type is not one this agent knows how to run
    #[error("unexpected step type {0}")]
    UnknownStepType(String),
}

/// Runner trait - common interface for all step handlers
#[async_trait]
pub trait Runner: Send + Sync {
    /// Name of the command this runner stands for
    fn command(&self) -> &str;

    /// Arguments the runner was constructed with
    fn args(&self) -> &[String];

    /// Execute the step once
    async fn run(&self) -> RunnerResult;
}
