//! Unary chat RPC service with message validation and graceful shutdown.

pub mod chat;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod message;
pub mod net;
pub mod observability;
pub mod rpc;
pub mod validation;

pub use config::ServerConfig;
pub use http::chat_router;
pub use lifecycle::{ServerLifecycle, Shutdown};
