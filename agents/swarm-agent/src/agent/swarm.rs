//! Swarm
//!
//! Orchestrates the simulated agents of this process: id allocation,
//! launching dispatch loops, and the process-wide exit switch.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::agent::dispatch::{DispatchLoop, LoopHandle};
use crate::agent::params::{NewAgentParams, WorkerConfig};
use crate::agent::registry::AgentRegistry;
use crate::agent::state::Agent;
use crate::agent::watcher::RebootWatcher;
use crate::connection::controller::Connector;
use crate::error::SwarmError;
use crate::runtime::factory::RunnerFactory;

/// Timing knobs shared by every agent
#[derive(Debug, Clone)]
pub struct SwarmSettings {
    pub reboot_poll_interval: Duration,
    pub default_instruction_interval: Duration,
    pub exit_grace: Duration,
}

impl Default for SwarmSettings {
    fn default() -> Self {
        Self {
            reboot_poll_interval: Duration::from_secs(1),
            default_instruction_interval: Duration::from_secs(60),
            exit_grace: Duration::from_millis(500),
        }
    }
}

fn exit_process(code: i32) {
    std::process::exit(code)
}

pub struct Swarm {
    next_id: AtomicI64,
    registry: AgentRegistry,
    connector: Arc<dyn Connector>,
    settings: SwarmSettings,
    exit_hook: fn(i32),
}

impl Swarm {
    pub fn new(connector: Arc<dyn Connector>, settings: SwarmSettings) -> Self {
        Self {
            next_id: AtomicI64::new(0),
            registry: AgentRegistry::new(),
            connector,
            settings,
            exit_hook: exit_process,
        }
    }

    /// Replace what `exit` calls once the grace delay has elapsed
    pub fn with_exit_hook(mut self, hook: fn(i32)) -> Self {
        self.exit_hook = hook;
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &SwarmSettings {
        &self.settings
    }

    /// Create an agent and start its loop, returning the loop handle
    ///
    /// Ids come from a process-wide counter; an id is consumed even when
    /// the request is then rejected. Nothing is registered or spawned on
    /// failure.
    pub fn launch(&self, params: NewAgentParams) -> Result<(Agent, LoopHandle), SwarmError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        let config = WorkerConfig::from_params(&params, self.settings.default_instruction_interval)?;
        let source = self
            .connector
            .connect(&config)
            .map_err(|e| SwarmError::Validation(e.to_string()))?;

        let agent = self.registry.create(id).map_err(|e| {
            warn!(agent_id = id, error = %e, "Agent id collision");
            SwarmError::Allocation(e.to_string())
        })?;

        let host_id = config.host_id();
        let watcher = RebootWatcher::new(
            id,
            config.dry_run.fake_reboot_marker_path.clone(),
            self.settings.reboot_poll_interval,
        );
        let interval = config.instruction_interval;
        let factory = RunnerFactory::new(Arc::new(config));

        let handle = DispatchLoop::new(id, source, factory, interval).spawn(
            host_id,
            watcher,
            self.registry.clone(),
        );

        info!(agent_id = id, host_id = %host_id, "Agent created");
        Ok((agent, handle))
    }

    /// Create an agent without waiting on its loop
    pub fn create_agent(&self, params: NewAgentParams) -> Result<Agent, SwarmError> {
        self.launch(params).map(|(agent, _)| agent)
    }

    /// Remove an agent's record; its loop keeps running
    pub fn delete_agent(&self, id: i64) -> Result<(), SwarmError> {
        self.registry.delete(id)?;
        info!(agent_id = id, "Agent deleted");
        Ok(())
    }

    pub fn get_agent(&self, id: i64) -> Result<Agent, SwarmError> {
        self.registry.get(id).ok_or(SwarmError::NotFound(id))
    }

    pub fn list_agents(&self) -> Vec<Agent> {
        self.registry.list()
    }

    /// Terminate the whole process after the grace delay
    pub fn exit(&self) {
        let grace = self.settings.exit_grace;
        let hook = self.exit_hook;
        warn!(grace_ms = grace.as_millis() as u64, "Exit requested, terminating process");

        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            hook(0);
        });
    }

    /// Liveness only
    pub fn health(&self) -> bool {
        true
    }
}
