//! Agent State
//!
//! The agent record kept by the registry, and the state machine tracking
//! one dispatch loop from start to drain.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle status of a simulated agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Running,
    Terminated,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Running => write!(f, "RUNNING"),
            AgentStatus::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// One simulated agent as reported by the REST surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_at: Option<DateTime<Utc>>,
}

impl Agent {
    /// A freshly created, running agent
    pub fn new(id: i64) -> Self {
        Self {
            id,
            status: AgentStatus::Running,
            created_at: Utc::now(),
            terminated_at: None,
        }
    }

    /// One-shot RUNNING -> TERMINATED transition
    ///
    /// Returns false when the agent was already terminated.
    pub fn terminate(&mut self) -> bool {
        if self.status == AgentStatus::Terminated {
            return false;
        }
        self.status = AgentStatus::Terminated;
        self.terminated_at = Some(Utc::now());
        true
    }

    pub fn is_running(&self) -> bool {
        self.status == AgentStatus::Running
    }
}

/// States of a dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Fetching and running steps
    Active,
    /// Cancellation observed, winding down
    Cancelled,
    /// Loop and watcher have exited
    Stopped,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::Active => write!(f, "Active"),
            LoopState::Cancelled => write!(f, "Cancelled"),
            LoopState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// State transition information
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: LoopState,
    pub to: LoopState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

struct LoopStateInner {
    current: LoopState,
    steps_run: u64,
    transitions: Vec<StateTransition>,
}

/// Thread-safe dispatch loop state
#[derive(Clone)]
pub struct LoopStateManager {
    agent_id: i64,
    inner: Arc<RwLock<LoopStateInner>>,
}

impl LoopStateManager {
    /// Create a new state manager starting in Active state
    pub fn new(agent_id: i64) -> Self {
        Self {
            agent_id,
            inner: Arc::new(RwLock::new(LoopStateInner {
                current: LoopState::Active,
                steps_run: 0,
                transitions: Vec::new(),
            })),
        }
    }

    pub fn current_state(&self) -> LoopState {
        self.inner.read().current
    }

    /// Number of steps dispatched so far
    pub fn steps_run(&self) -> u64 {
        self.inner.read().steps_run
    }

    pub fn record_step(&self) {
        self.inner.write().steps_run += 1;
    }

    /// Transition to a new state
    pub fn transition_to(&self, new_state: LoopState, reason: Option<String>) -> bool {
        let mut inner = self.inner.write();

        if !Self::is_valid_transition(inner.current, new_state) {
            tracing::warn!(
                agent_id = self.agent_id,
                from = %inner.current,
                to = %new_state,
                "Rejected loop state transition"
            );
            return false;
        }

        if inner.current == new_state {
            return true;
        }

        let old_state = inner.current;
        inner.current = new_state;
        inner.transitions.push(StateTransition {
            from: old_state,
            to: new_state,
            timestamp: Utc::now(),
            reason,
        });

        tracing::info!(
            agent_id = self.agent_id,
            from = %old_state,
            to = %new_state,
            steps_run = inner.steps_run,
            "Agent loop state transition"
        );

        true
    }

    fn is_valid_transition(from: LoopState, to: LoopState) -> bool {
        if from == to {
            return true;
        }

        matches!(
            (from, to),
            (LoopState::Active, LoopState::Cancelled)
                | (LoopState::Active, LoopState::Stopped)
                | (LoopState::Cancelled, LoopState::Stopped)
        )
    }

    pub fn set_cancelled(&self) {
        self.transition_to(LoopState::Cancelled, Some("Cancellation observed".to_string()));
    }

    pub fn set_stopped(&self, reason: Option<String>) {
        self.transition_to(LoopState::Stopped, reason);
    }

    /// Get recent state transitions
    pub fn recent_transitions(&self, count: usize) -> Vec<StateTransition> {
        let inner = self.inner.read();
        inner.transitions.iter().rev().take(count).cloned().collect()
    }
}
