//! Administrative control surface of the round loop.
//!
//! Every call takes effect at the next round boundary. Transition requests
//! are answered by the loop itself, so the caller learns synchronously
//! whether the state machine accepted them.

use mindloop_domain::{AgentState, DomainError, StateTransition};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Errors returned to administrative callers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    #[error(transparent)]
    Rejected(#[from] DomainError),

    #[error("Round loop is not running")]
    LoopStopped,
}

/// Pause state shared with the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Gate {
    pub paused: bool,
    /// Rounds the loop may run while paused
    pub step_tokens: u32,
}

pub(crate) struct TransitionRequest {
    pub to: AgentState,
    pub reason: String,
    pub reply: oneshot::Sender<Result<StateTransition, ControlError>>,
}

struct ControlShared {
    gate: watch::Sender<Gate>,
    state: watch::Sender<AgentState>,
    requests: mpsc::UnboundedSender<TransitionRequest>,
    cancel: CancellationToken,
    shutdown_reason: Mutex<Option<String>>,
}

/// Handle for pausing, stepping, redirecting and stopping the round loop.
#[derive(Clone)]
pub struct AdminControl {
    shared: Arc<ControlShared>,
}

/// The loop's end of the control channels.
pub(crate) struct ControlReceiver {
    pub gate: watch::Receiver<Gate>,
    pub requests: mpsc::UnboundedReceiver<TransitionRequest>,
}

impl AdminControl {
    pub(crate) fn new(initial: AgentState) -> (Self, ControlReceiver) {
        let (gate_tx, gate_rx) = watch::channel(Gate::default());
        let (state_tx, _) = watch::channel(initial);
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let control = Self {
            shared: Arc::new(ControlShared {
                gate: gate_tx,
                state: state_tx,
                requests: req_tx,
                cancel: CancellationToken::new(),
                shutdown_reason: Mutex::new(None),
            }),
        };
        (
            control,
            ControlReceiver {
                gate: gate_rx,
                requests: req_rx,
            },
        )
    }

    /// Stop starting new rounds after the current one.
    pub fn pause(&self) {
        self.shared.gate.send_modify(|g| g.paused = true);
        info!("Round loop pause requested");
    }

    pub fn resume(&self) {
        self.shared.gate.send_modify(|g| {
            g.paused = false;
            g.step_tokens = 0;
        });
        info!("Round loop resume requested");
    }

    /// Let a paused loop run exactly one more round.
    pub fn step(&self) {
        self.shared.gate.send_modify(|g| {
            if g.paused {
                g.step_tokens += 1;
            }
        });
    }

    pub fn is_paused(&self) -> bool {
        self.shared.gate.borrow().paused
    }

    /// Ask the loop to apply a manual transition at the next boundary.
    pub async fn request_transition(
        &self,
        to: AgentState,
        reason: impl Into<String>,
    ) -> Result<StateTransition, ControlError> {
        let (reply, answer) = oneshot::channel();
        self.shared
            .requests
            .send(TransitionRequest {
                to,
                reason: reason.into(),
                reply,
            })
            .map_err(|_| ControlError::LoopStopped)?;
        answer.await.map_err(|_| ControlError::LoopStopped)?
    }

    /// Request shutdown. In-flight work gets the configured deadline to
    /// drain; the first reason given wins.
    pub fn shutdown(&self, reason: impl Into<String>) {
        let reason = reason.into();
        {
            let mut slot = self
                .shared
                .shutdown_reason
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                info!(reason = %reason, "Shutdown requested");
                *slot = Some(reason);
            }
        }
        self.shared.cancel.cancel();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    pub fn shutdown_reason(&self) -> Option<String> {
        self.shared
            .shutdown_reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Operating mode as of the last round boundary.
    pub fn state(&self) -> AgentState {
        *self.shared.state.borrow()
    }

    /// A receiver that sees every mode change.
    pub fn watch_state(&self) -> watch::Receiver<AgentState> {
        self.shared.state.subscribe()
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.shared.cancel
    }

    pub(crate) fn consume_step(&self) {
        self.shared.gate.send_modify(|g| g.step_tokens = g.step_tokens.saturating_sub(1));
    }

    pub(crate) fn publish_state(&self, state: AgentState) {
        self.shared.state.send_replace(state);
    }
}
