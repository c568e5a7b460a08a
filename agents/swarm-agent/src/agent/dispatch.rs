//! Dispatch Loop
//!
//! Drives one simulated agent: register with the controller, fetch steps,
//! run each through the runner factory and report the result, until the
//! agent is cancelled or the controller ends the conversation.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agent::registry::AgentRegistry;
use crate::agent::state::{LoopState, LoopStateManager};
use crate::agent::watcher::RebootWatcher;
use crate::connection::controller::StepSource;
use crate::connection::protocol::{PostStepAction, Step, StepReply};
use crate::runtime::adapter::Runner;
use crate::runtime::factory::RunnerFactory;

/// Why a dispatch loop returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// Cancellation was observed at an iteration boundary
    Cancelled,
    /// The controller asked the agent to stop
    ControllerExit,
    /// An unrecoverable error ended the loop
    Fatal(String),
}

impl std::fmt::Display for LoopExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopExit::Cancelled => write!(f, "cancelled"),
            LoopExit::ControllerExit => write!(f, "controller requested exit"),
            LoopExit::Fatal(reason) => write!(f, "fatal: {reason}"),
        }
    }
}

pub struct DispatchLoop {
    agent_id: i64,
    source: Arc<dyn StepSource>,
    factory: RunnerFactory,
    interval: Duration,
    state: LoopStateManager,
}

impl DispatchLoop {
    pub fn new(
        agent_id: i64,
        source: Arc<dyn StepSource>,
        factory: RunnerFactory,
        interval: Duration,
    ) -> Self {
        Self {
            agent_id,
            source,
            factory,
            interval,
            state: LoopStateManager::new(agent_id),
        }
    }

    pub fn state(&self) -> &LoopStateManager {
        &self.state
    }

    /// Run until cancelled, told to exit, or a fatal controller error
    pub async fn run(&self, cancel: &CancellationToken) -> LoopExit {
        let exit = self.run_inner(cancel).await;
        if exit == LoopExit::Cancelled {
            self.state.set_cancelled();
        }
        exit
    }

    async fn run_inner(&self, cancel: &CancellationToken) -> LoopExit {
        if let Some(exit) = self.register(cancel).await {
            return exit;
        }

        loop {
            if cancel.is_cancelled() {
                return LoopExit::Cancelled;
            }

            let steps = match self.source.next_steps().await {
                Ok(steps) => steps,
                Err(e) if e.is_fatal() => {
                    error!(agent_id = self.agent_id, error = %e, "Failed to fetch steps");
                    return LoopExit::Fatal(e.to_string());
                }
                Err(e) => {
                    warn!(agent_id = self.agent_id, error = %e, "Failed to fetch steps, retrying");
                    if !pause(cancel, self.interval).await {
                        return LoopExit::Cancelled;
                    }
                    continue;
                }
            };

            debug!(
                agent_id = self.agent_id,
                count = steps.instructions.len(),
                "Received steps"
            );

            for step in &steps.instructions {
                if cancel.is_cancelled() {
                    return LoopExit::Cancelled;
                }

                let reply = self.dispatch(step).await;
                if let Err(e) = self.source.post_reply(&reply).await {
                    warn!(
                        agent_id = self.agent_id,
                        step_id = %step.step_id,
                        error = %e,
                        "Failed to post step reply"
                    );
                }
            }

            if steps.post_step_action == PostStepAction::Exit {
                info!(agent_id = self.agent_id, "Controller requested exit");
                return LoopExit::ControllerExit;
            }

            let wait = steps
                .next_instruction_seconds
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(self.interval);
            if !pause(cancel, wait).await {
                return LoopExit::Cancelled;
            }
        }
    }

    /// Returns `Some` when the loop must end before any step is fetched
    async fn register(&self, cancel: &CancellationToken) -> Option<LoopExit> {
        loop {
            if cancel.is_cancelled() {
                return Some(LoopExit::Cancelled);
            }

            match self.source.register().await {
                Ok(()) => {
                    info!(agent_id = self.agent_id, "Agent registered");
                    return None;
                }
                Err(e) if e.is_fatal() => {
                    error!(agent_id = self.agent_id, error = %e, "Registration rejected");
                    return Some(LoopExit::Fatal(e.to_string()));
                }
                Err(e) => {
                    warn!(agent_id = self.agent_id, error = %e, "Registration failed, retrying");
                    if !pause(cancel, self.interval).await {
                        return Some(LoopExit::Cancelled);
                    }
                }
            }
        }
    }

    /// Resolve and run a single step
    ///
    /// Unknown step types and invalid arguments become error replies and
    /// nothing is executed.
    pub async fn dispatch(&self, step: &Step) -> StepReply {
        self.state.record_step();

        let runner = step
            .kind()
            .and_then(|kind| self.factory.create(kind, step.args.clone()));

        match runner {
            Ok(runner) => {
                debug!(
                    agent_id = self.agent_id,
                    step_id = %step.step_id,
                    step_type = %step.step_type,
                    command = runner.command(),
                    "Running step"
                );
                let result = runner.run().await;
                if !result.is_success() {
                    warn!(
                        agent_id = self.agent_id,
                        step_id = %step.step_id,
                        exit_code = result.exit_code,
                        stderr = %result.stderr,
                        "Step failed"
                    );
                }
                StepReply::from_result(step, result)
            }
            Err(e) => {
                warn!(
                    agent_id = self.agent_id,
                    step_id = %step.step_id,
                    step_type = %step.step_type,
                    error = %e,
                    "Step rejected"
                );
                StepReply::rejected(step, &e)
            }
        }
    }

    /// Start the loop and its reboot watcher on the runtime
    ///
    /// The agent is marked terminated in `registry` once both tasks have
    /// finished, before the handle's barrier releases.
    pub fn spawn(self, host_id: Uuid, watcher: RebootWatcher, registry: AgentRegistry) -> LoopHandle {
        let agent_id = self.agent_id;
        let cancel = CancellationToken::new();
        let state = self.state.clone();
        let (done_tx, done_rx) = watch::channel(false);

        let task_cancel = cancel.clone();
        let task_state = state.clone();
        let span = info_span!("agent", agent_id, host_id = %host_id);

        tokio::spawn(
            async move {
                let watcher_task = tokio::spawn(watcher.watch(task_cancel.clone()).in_current_span());

                let loop_cancel = task_cancel.clone();
                let exit = match tokio::spawn(
                    async move { self.run(&loop_cancel).await }.in_current_span(),
                )
                .await
                {
                    Ok(exit) => exit,
                    Err(e) => LoopExit::Fatal(format!("dispatch loop aborted: {e}")),
                };

                task_cancel.cancel();
                let rebooted = match watcher_task.await {
                    Ok(rebooted) => rebooted,
                    Err(e) => {
                        error!(error = %e, "Reboot watcher aborted");
                        false
                    }
                };

                task_state.set_stopped(Some(exit.to_string()));
                registry.mark_terminated(agent_id);
                let path: Vec<String> = task_state
                    .recent_transitions(usize::MAX)
                    .iter()
                    .rev()
                    .map(|t| t.to.to_string())
                    .collect();
                info!(
                    %exit,
                    rebooted,
                    steps_run = task_state.steps_run(),
                    path = ?path,
                    "Agent terminated"
                );

                let _ = done_tx.send(true);
            }
            .instrument(span),
        );

        LoopHandle {
            agent_id,
            cancel,
            state,
            done: done_rx,
        }
    }
}

/// Sleep for `duration` unless cancelled first; false when cancelled
async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Control over a spawned dispatch loop
#[derive(Clone)]
pub struct LoopHandle {
    agent_id: i64,
    cancel: CancellationToken,
    state: LoopStateManager,
    done: watch::Receiver<bool>,
}

impl LoopHandle {
    pub fn agent_id(&self) -> i64 {
        self.agent_id
    }

    /// Request cooperative cancellation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> LoopState {
        self.state.current_state()
    }

    pub fn is_finished(&self) -> bool {
        *self.done.borrow()
    }

    /// Wait until the loop and watcher have drained and the agent is
    /// marked terminated
    pub async fn wait(&self) {
        let mut done = self.done.clone();
        let _ = done.wait_for(|finished| *finished).await;
    }
}
