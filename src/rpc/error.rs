//! Call-level error taxonomy and its wire representation.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::rpc::code::Code;
use crate::validation::{InvalidMessage, Violation};

/// Message sent to callers for server-side faults; details stay in the logs.
pub const OPAQUE_INTERNAL_MESSAGE: &str = "internal error";

/// Errors a call can end with.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The caller cancelled (or disconnected) before the handler ran.
    #[error("call canceled")]
    Canceled,

    /// The call deadline passed before the handler ran.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The request failed its rule set.
    #[error(transparent)]
    InvalidRequest(InvalidMessage),

    /// The handler produced a response that failed its rule set.
    #[error("response failed validation: {0}")]
    InvalidResponse(InvalidMessage),

    /// The request could not be turned into a message.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// An explicit classification raised by an interceptor or handler.
    #[error("{message}")]
    Status { code: Code, message: String },

    /// Anything unexpected from business logic.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        RpcError::Status {
            code,
            message: message.into(),
        }
    }

    /// Wrap an unexpected failure.
    pub fn internal(err: impl fmt::Display) -> Self {
        RpcError::Internal(err.to_string())
    }

    pub fn code(&self) -> Code {
        match self {
            RpcError::Canceled => Code::Canceled,
            RpcError::DeadlineExceeded => Code::DeadlineExceeded,
            RpcError::InvalidRequest(_) | RpcError::Malformed(_) => Code::InvalidArgument,
            RpcError::InvalidResponse(_) | RpcError::Internal(_) => Code::Internal,
            RpcError::Status { code, .. } => *code,
        }
    }

    /// Violations the caller may act on. Empty for everything but request validation.
    pub fn violations(&self) -> &[Violation] {
        match self {
            RpcError::InvalidRequest(invalid) => &invalid.violations,
            _ => &[],
        }
    }

    /// What the caller gets to see.
    pub fn to_wire(&self) -> WireError {
        let message = match self {
            RpcError::InvalidResponse(_) | RpcError::Internal(_) => {
                OPAQUE_INTERNAL_MESSAGE.to_string()
            }
            other => other.to_string(),
        };
        WireError {
            code: self.code(),
            message,
            details: self.violations().to_vec(),
        }
    }
}

/// JSON error body: `{"code": "...", "message": "...", "details": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct WireError {
    pub code: Code,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Violation>,
}
