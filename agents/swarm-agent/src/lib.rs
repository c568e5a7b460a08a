//! Assisted Swarm Agent Library
//!
//! This crate runs many simulated installation agents inside one process.
//! It provides the agent registry, the per-agent step dispatch loop with its
//! reboot watcher, the step runner factory, the controller client, and the
//! REST surface used to create and tear down agents.

pub mod agent;
pub mod api;
pub mod cli;
pub mod connection;
pub mod error;
pub mod runtime;

// Re-exports for convenience
pub use agent::dispatch::{DispatchLoop, LoopExit, LoopHandle};
pub use agent::params::{NewAgentParams, WorkerConfig};
pub use agent::registry::AgentRegistry;
pub use agent::state::{Agent, AgentStatus, LoopState, LoopStateManager};
pub use agent::swarm::{Swarm, SwarmSettings};
pub use agent::watcher::RebootWatcher;
pub use cli::config::Config;
pub use connection::controller::{Connector, ControllerClient, ControllerError, HttpConnector, StepSource};
pub use connection::protocol::{Step, StepReply, StepType, Steps};
pub use error::SwarmError;
pub use runtime::adapter::{Runner, RunnerResult, StepError};
pub use runtime::factory::{RunnerFactory, StepRunner};
