//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (manager.rs):
//!     Bind listener → Running → accept loop in background task
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (manager.rs):
//!     Trigger observed → Stop accepting → Drain in-flight (in_flight.rs) → Stopped
//! ```
//!
//! # Design Decisions
//! - Bind errors surface from `start`, not from a background task
//! - Shutdown has timeout: abandoned requests are counted and reported
//! - State transitions are compare-and-set (state.rs)

pub mod in_flight;
pub mod manager;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use in_flight::InFlightTracker;
pub use manager::{LifecycleError, ServerLifecycle, EXIT_FAILURE, EXIT_OK, EXIT_SHUTDOWN_TIMEOUT};
pub use shutdown::Shutdown;
pub use signals::spawn_signal_listener;
pub use state::{InvalidTransition, LifecycleState, StateMachine};
