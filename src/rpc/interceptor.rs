//! Composable unary interceptors.
//!
//! # Responsibilities
//! - Define the unary call shape shared by handlers and interceptors
//! - Compose interceptors around a handler in registration order
//!
//! # Design Decisions
//! - An interceptor is a function from `next` to a new call; it may inspect the
//!   context, short-circuit, call through, and transform the outcome
//! - The chain is composed once at startup; each call just runs the result
//! - The first registered interceptor is the outermost: it sees the call first
//!   and the outcome last
//!
//! # Data Flow
//! ```text
//! A.pre → B.pre → handler → B.post → A.post
//! ```

use std::fmt;
use std::future::{self, Future};
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::message::{AnyMessage, Message};
use crate::rpc::context::CallContext;
use crate::rpc::error::RpcError;

/// The future a unary call resolves through.
pub type UnaryFuture = BoxFuture<'static, Result<AnyMessage, RpcError>>;

/// A unary call: a handler, or a handler wrapped by interceptors.
pub type UnaryFunc = Arc<dyn Fn(CallContext, AnyMessage) -> UnaryFuture + Send + Sync>;

/// Wraps a unary call with extra behaviour.
pub trait Interceptor: Send + Sync + 'static {
    fn wrap(&self, next: UnaryFunc) -> UnaryFunc;
}

impl<F> Interceptor for F
where
    F: Fn(UnaryFunc) -> UnaryFunc + Send + Sync + 'static,
{
    fn wrap(&self, next: UnaryFunc) -> UnaryFunc {
        self(next)
    }
}

/// Box an async closure as a [`UnaryFunc`].
pub fn unary_fn<F, Fut>(f: F) -> UnaryFunc
where
    F: Fn(CallContext, AnyMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AnyMessage, RpcError>> + Send + 'static,
{
    Arc::new(move |ctx: CallContext, msg: AnyMessage| -> UnaryFuture { Box::pin(f(ctx, msg)) })
}

/// Adapt a typed handler to the type-erased call shape.
///
/// A request of the wrong type is a wiring bug and surfaces as an internal error.
pub fn typed_unary<Req, Resp, F, Fut>(handler: F) -> UnaryFunc
where
    Req: Message,
    Resp: Message,
    F: Fn(CallContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, RpcError>> + Send + 'static,
{
    Arc::new(move |ctx: CallContext, msg: AnyMessage| -> UnaryFuture {
        let type_name = msg.type_name();
        let Some(request) = msg.downcast::<Req>() else {
            return Box::pin(future::ready(Err(RpcError::internal(format!(
                "unexpected request message type {type_name}"
            )))));
        };
        let call = handler(ctx, request);
        Box::pin(async move { call.await.map(AnyMessage::new) })
    })
}

/// An ordered list of interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor. It runs inside every interceptor added before it.
    pub fn with(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Wrap `handler` with every interceptor. An empty chain returns the handler itself.
    pub fn apply(&self, handler: UnaryFunc) -> UnaryFunc {
        self.interceptors
            .iter()
            .rev()
            .fold(handler, |next, interceptor| interceptor.wrap(next))
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}
