//! Server lifecycle state machine.
//!
//! ```text
//! Starting ──bind ok──▶ Running ──shutdown──▶ ShuttingDown ──drained / timed out──▶ Stopped
//!     │
//!     └──bind failed──▶ FailedToStart
//! ```
//!
//! Transitions are compare-and-set: of two concurrent attempts at the same
//! transition exactly one succeeds.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    ShuttingDown,
    Stopped,
    FailedToStart,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Stopped | LifecycleState::FailedToStart)
    }

    fn can_become(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Starting, Running)
                | (Starting, FailedToStart)
                | (Running, ShuttingDown)
                | (ShuttingDown, Stopped)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Stopped => "stopped",
            LifecycleState::FailedToStart => "failed_to_start",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid lifecycle transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

/// Shared, observable lifecycle state.
#[derive(Debug, Clone)]
pub struct StateMachine {
    tx: Arc<watch::Sender<LifecycleState>>,
}

impl StateMachine {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LifecycleState::Starting);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Move to `next` if the current state allows it. Returns the previous state.
    pub fn transition(&self, next: LifecycleState) -> Result<LifecycleState, InvalidTransition> {
        let mut outcome = Err(InvalidTransition {
            from: next,
            to: next,
        });
        self.tx.send_if_modified(|state| {
            if state.can_become(next) {
                outcome = Ok(*state);
                *state = next;
                true
            } else {
                outcome = Err(InvalidTransition {
                    from: *state,
                    to: next,
                });
                false
            }
        });

        if let Ok(previous) = outcome {
            tracing::debug!(from = %previous, to = %next, "Lifecycle transition");
        }
        outcome
    }

    /// Resolves with the terminal state once one is reached.
    pub async fn wait_terminal(&self) -> LifecycleState {
        let mut rx = self.tx.subscribe();
        let state = match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.current(),
        };
        state
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleState::*;

    #[test]
    fn happy_path() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), Starting);
        assert_eq!(sm.transition(Running), Ok(Starting));
        assert_eq!(sm.transition(ShuttingDown), Ok(Running));
        assert_eq!(sm.transition(Stopped), Ok(ShuttingDown));
        assert!(sm.current().is_terminal());
    }

    #[test]
    fn bind_failure_path() {
        let sm = StateMachine::new();
        sm.transition(FailedToStart).unwrap();
        assert_eq!(
            sm.transition(Running),
            Err(InvalidTransition {
                from: FailedToStart,
                to: Running
            })
        );
    }

    #[test]
    fn no_skipping_or_going_back() {
        let sm = StateMachine::new();
        assert!(sm.transition(ShuttingDown).is_err());
        assert!(sm.transition(Stopped).is_err());
        sm.transition(Running).unwrap();
        assert!(sm.transition(Starting).is_err());
        assert!(sm.transition(Running).is_err());
    }

    #[test]
    fn same_transition_succeeds_once() {
        let sm = StateMachine::new();
        sm.transition(Running).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sm = sm.clone();
                std::thread::spawn(move || sm.transition(ShuttingDown).is_ok())
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn observers_see_terminal_state() {
        let sm = StateMachine::new();
        let waiter = {
            let sm = sm.clone();
            tokio::spawn(async move { sm.wait_terminal().await })
        };
        sm.transition(Running).unwrap();
        sm.transition(ShuttingDown).unwrap();
        sm.transition(Stopped).unwrap();
        assert_eq!(waiter.await.unwrap(), Stopped);
    }
}
