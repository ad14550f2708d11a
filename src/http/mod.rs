//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net)
//!     → server.rs (Axum router, one POST route per procedure)
//!     → request.rs (content type, deadline, peer → CallContext)
//!     → JSON decode → interceptor chain → handler
//!     → response.rs (JSON reply, or WireError with mapped status)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::TIMEOUT_HEADER;
pub use server::{chat_router, Procedure, RpcServer};
