//! Per-call context.
//!
//! # Responsibilities
//! - Carry the procedure name, peer and request headers to every interceptor
//! - Carry the call's deadline and cancellation signal down to the handler
//!
//! # Design Decisions
//! - Read-only once built: the `with_*` methods consume and return a new value,
//!   so deriving a context never alters one that is already shared
//! - Each call owns its own cancellation token; cancelling one call never
//!   touches another
//! - Deadlines only tighten when derived

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, Method};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::rpc::error::RpcError;

/// The remote end of a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Peer {
    pub addr: Option<SocketAddr>,
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.addr {
            Some(addr) => write!(f, "{addr}"),
            None => f.write_str("unknown"),
        }
    }
}

/// Everything an interceptor or handler may know about the call besides the message.
#[derive(Debug, Clone)]
pub struct CallContext {
    procedure: Arc<str>,
    peer: Peer,
    headers: Arc<HeaderMap>,
    http_method: Method,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl CallContext {
    /// A fresh context for `procedure` with no deadline and its own cancellation token.
    pub fn new(procedure: impl Into<Arc<str>>) -> Self {
        Self {
            procedure: procedure.into(),
            peer: Peer::default(),
            headers: Arc::new(HeaderMap::new()),
            http_method: Method::POST,
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_peer(mut self, addr: SocketAddr) -> Self {
        self.peer = Peer { addr: Some(addr) };
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Arc::new(headers);
        self
    }

    pub fn with_http_method(mut self, method: Method) -> Self {
        self.http_method = method;
        self
    }

    /// Set a deadline. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Set a deadline `timeout` from now. An earlier existing deadline is kept.
    ///
    /// A timeout too large to represent leaves the deadline unchanged.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Replace the cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Derive a context whose cancellation follows this one but can also be
    /// cancelled on its own.
    pub fn child(&self) -> Self {
        let mut child = self.clone();
        child.cancel = self.cancel.child_token();
        child
    }

    /// Procedure identifier, e.g. `/chat.v1.ChatService/Say`.
    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    pub fn peer(&self) -> Peer {
        self.peer
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `User-Agent` header, or an empty string.
    pub fn user_agent(&self) -> &str {
        self.headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Why the call should stop, if it should. Cancellation wins over expiry.
    pub fn err(&self) -> Option<RpcError> {
        if self.is_cancelled() {
            Some(RpcError::Canceled)
        } else if self.is_expired() {
            Some(RpcError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// `Err` when the call has been cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), RpcError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resolves once the call is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Resolves once the call is cancelled or its deadline passes.
    pub async fn done(&self) -> RpcError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.cancel.cancelled() => RpcError::Canceled,
                () = tokio::time::sleep_until(deadline) => RpcError::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                RpcError::Canceled
            }
        }
    }
}
