//! Server lifecycle manager.
//!
//! # Responsibilities
//! - Bind the listener and run the accept loop in a background task
//! - Wait for the shutdown trigger (signal, serve failure, or caller)
//! - Drain in-flight calls within a deadline, then report the outcome
//!
//! # Design Decisions
//! - Bind failures are reported by `start`, never by a later call
//! - A failed accept loop triggers shutdown itself so the controller wakes up
//! - On drain timeout the accept loop is aborted; calls still running are
//!   abandoned and counted in the error

use std::net::SocketAddr;
use std::time::Duration;

use axum::{middleware, Router};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinHandle};

use crate::lifecycle::in_flight::{track_in_flight, InFlightTracker};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::state::{InvalidTransition, LifecycleState, StateMachine};
use crate::net::{self, ListenerError};

/// Process exit code for a clean shutdown.
pub const EXIT_OK: u8 = 0;
/// Process exit code for startup, serve and other failures.
pub const EXIT_FAILURE: u8 = 1;
/// Process exit code when draining exceeded the shutdown timeout.
pub const EXIT_SHUTDOWN_TIMEOUT: u8 = 2;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Bind(#[from] ListenerError),

    #[error("accept loop failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("accept loop task failed: {0}")]
    Join(#[from] JoinError),

    #[error("shutdown timed out after {timeout:?} with {abandoned} request(s) still in flight")]
    ShutdownTimeout { timeout: Duration, abandoned: u64 },

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl LifecycleError {
    pub fn exit_code(&self) -> u8 {
        match self {
            LifecycleError::ShutdownTimeout { .. } => EXIT_SHUTDOWN_TIMEOUT,
            _ => EXIT_FAILURE,
        }
    }
}

type AcceptLoop = JoinHandle<std::io::Result<()>>;

/// Owns the server from bind to stop.
pub struct ServerLifecycle {
    router: Option<Router>,
    shutdown: Shutdown,
    state: StateMachine,
    in_flight: InFlightTracker,
    accept_loop: Mutex<Option<AcceptLoop>>,
    local_addr: Option<SocketAddr>,
}

impl ServerLifecycle {
    pub fn new(router: Router, shutdown: Shutdown) -> Self {
        Self {
            router: Some(router),
            shutdown,
            state: StateMachine::new(),
            in_flight: InFlightTracker::new(),
            accept_loop: Mutex::new(None),
            local_addr: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state.current()
    }

    /// Observe lifecycle transitions.
    pub fn state_machine(&self) -> &StateMachine {
        &self.state
    }

    pub fn shutdown_handle(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Requests currently being served.
    pub fn in_flight(&self) -> u64 {
        self.in_flight.count()
    }

    /// The bound address, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Bind `address` and start accepting calls in the background.
    ///
    /// On bind failure the state becomes `FailedToStart` and shutdown is triggered.
    pub async fn start(&mut self, address: &str) -> Result<SocketAddr, LifecycleError> {
        let Some(router) = self.router.take() else {
            return Err(InvalidTransition {
                from: self.state.current(),
                to: LifecycleState::Running,
            }
            .into());
        };

        let (listener, local_addr) = match net::bind(address).await {
            Ok(bound) => bound,
            Err(err) => {
                tracing::error!(address, error = %err, "Server failed to start");
                self.state.transition(LifecycleState::FailedToStart)?;
                self.shutdown.trigger();
                return Err(err.into());
            }
        };

        self.state.transition(LifecycleState::Running)?;

        let app = router
            .layer(middleware::from_fn_with_state(
                self.in_flight.clone(),
                track_in_flight,
            ))
            .into_make_service_with_connect_info::<SocketAddr>();

        let shutdown = self.shutdown.clone();
        let accept_loop = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.wait_owned())
                .await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "Accept loop failed");
                shutdown.trigger();
            }
            result
        });

        *self.accept_loop.get_mut() = Some(accept_loop);
        self.local_addr = Some(local_addr);

        tracing::info!(address = %local_addr, "Server is running");
        Ok(local_addr)
    }

    /// Resolves once shutdown has been triggered.
    pub async fn await_shutdown_signal(&self) {
        self.shutdown.wait().await;
    }

    /// Stop accepting, drain in-flight calls for up to `timeout`, then stop.
    ///
    /// Only one caller wins; others get `InvalidTransition`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), LifecycleError> {
        self.state.transition(LifecycleState::ShuttingDown)?;
        self.shutdown.trigger();

        tracing::info!(
            in_flight = self.in_flight.count(),
            timeout = ?timeout,
            "Draining in-flight requests"
        );

        let accept_loop = self.accept_loop.lock().await.take();
        let outcome = match accept_loop {
            Some(handle) => self.drain(handle, timeout).await,
            None => Ok(()),
        };

        self.state.transition(LifecycleState::Stopped)?;

        match &outcome {
            Ok(()) => tracing::info!("Server stopped gracefully"),
            Err(e) => tracing::error!(error = %e, "Server stopped with errors"),
        }
        outcome
    }

    async fn drain(&self, mut handle: AcceptLoop, timeout: Duration) -> Result<(), LifecycleError> {
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(LifecycleError::Serve(e)),
            Ok(Err(e)) => Err(LifecycleError::Join(e)),
            Err(_) => {
                handle.abort();
                let abandoned = self.in_flight.count();
                tracing::warn!(
                    abandoned,
                    timeout = ?timeout,
                    "Shutdown timeout reached, abandoning in-flight requests"
                );
                Err(LifecycleError::ShutdownTimeout { timeout, abandoned })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let timeout = LifecycleError::ShutdownTimeout {
            timeout: Duration::from_secs(1),
            abandoned: 3,
        };
        assert_eq!(timeout.exit_code(), EXIT_SHUTDOWN_TIMEOUT);
        assert!(timeout.to_string().contains("3 request(s)"));

        let serve = LifecycleError::Serve(std::io::Error::other("boom"));
        assert_eq!(serve.exit_code(), EXIT_FAILURE);
    }

    #[tokio::test]
    async fn shutdown_before_start_is_rejected() {
        let lifecycle = ServerLifecycle::new(Router::new(), Shutdown::new());
        let err = lifecycle.shutdown(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition(_)));
        assert_eq!(lifecycle.state(), LifecycleState::Starting);
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let mut lifecycle = ServerLifecycle::new(Router::new(), Shutdown::new());
        lifecycle.start("127.0.0.1:0").await.unwrap();
        let err = lifecycle.start("127.0.0.1:0").await.unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition(_)));
        lifecycle.shutdown(Duration::from_secs(1)).await.unwrap();
    }
}
