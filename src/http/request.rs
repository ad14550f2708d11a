//! Request handling: turning an HTTP request into a call context.
//!
//! # Responsibilities
//! - Check the content type before the body is read
//! - Derive the call deadline from `connect-timeout-ms` and the server default
//! - Capture peer address, method and headers for interceptors
//!
//! # Design Decisions
//! - A malformed timeout header rejects the call; it is never silently ignored
//! - The header can only shorten the server's default call timeout

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::{header, request::Parts, HeaderMap};

use crate::rpc::{CallContext, RpcError};

/// Per-call timeout header, in milliseconds.
pub const TIMEOUT_HEADER: &str = "connect-timeout-ms";

const MAX_TIMEOUT_DIGITS: usize = 10;

/// `true` when the request carries no content type or a JSON one.
pub fn is_json(headers: &HeaderMap) -> bool {
    match headers.get(header::CONTENT_TYPE) {
        None => true,
        Some(value) => value
            .to_str()
            .map(|ct| {
                ct.split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .eq_ignore_ascii_case("application/json")
            })
            .unwrap_or(false),
    }
}

/// Parse the timeout header. `Ok(None)` when absent.
pub fn parse_timeout(headers: &HeaderMap) -> Result<Option<Duration>, RpcError> {
    let Some(value) = headers.get(TIMEOUT_HEADER) else {
        return Ok(None);
    };

    let invalid = || RpcError::Malformed(format!("invalid {TIMEOUT_HEADER} header"));
    let text = value.to_str().map_err(|_| invalid())?;
    if text.is_empty()
        || text.len() > MAX_TIMEOUT_DIGITS
        || !text.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }
    let millis: u64 = text.parse().map_err(|_| invalid())?;
    Ok(Some(Duration::from_millis(millis)))
}

/// Build the context for one call of `procedure`.
pub fn call_context(
    procedure: &str,
    parts: &Parts,
    default_timeout: Duration,
) -> Result<CallContext, RpcError> {
    let mut ctx = CallContext::new(procedure)
        .with_http_method(parts.method.clone())
        .with_headers(parts.headers.clone())
        .with_timeout(default_timeout);

    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        ctx = ctx.with_peer(*addr);
    }
    if let Some(timeout) = parse_timeout(&parts.headers)? {
        ctx = ctx.with_timeout(timeout);
    }

    Ok(ctx)
}
