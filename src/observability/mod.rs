//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured key/value records)
//!
//! logging.rs installs the subscriber:
//!     → EnvFilter (config filter, RUST_LOG overrides)
//!     → fmt layer (pretty or JSON) on stdout
//! ```
//!
//! # Design Decisions
//! - Per-call records come from the logging interceptor, not from handlers
//! - JSON format for production, pretty format for development
//! - The subscriber is installed once by the binary; the library never installs one

pub mod logging;

#[cfg(test)]
pub(crate) mod capture;
