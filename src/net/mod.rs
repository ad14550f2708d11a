//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured bind address
//!     → listener.rs (resolve, bind, report local address)
//!     → Hand off to the lifecycle manager's accept loop
//! ```

pub mod listener;

pub use listener::{bind, ListenerError};
