//! Unary RPC plumbing independent of any particular service.
//!
//! # Data Flow
//! ```text
//! transport builds CallContext + decoded AnyMessage
//!     → InterceptorChain (logging, ...)
//!     → typed handler
//!     → Result<AnyMessage, RpcError>
//!     → transport encodes reply or WireError
//! ```

pub mod code;
pub mod context;
pub mod error;
pub mod interceptor;
pub mod logging;

pub use code::Code;
pub use context::{CallContext, Peer};
pub use error::{RpcError, WireError};
pub use interceptor::{
    typed_unary, unary_fn, Interceptor, InterceptorChain, UnaryFunc, UnaryFuture,
};
pub use logging::LoggingInterceptor;
