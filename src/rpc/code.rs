//! Outcome classification shared by the wire format and the logs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error classification of a failed call.
///
/// Tells the caller whether retrying with different input could help:
/// `InvalidArgument` is the caller's fault, `Internal` is ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    /// The caller cancelled the call.
    Canceled,
    /// An error that fits no other classification.
    Unknown,
    /// The request failed validation or could not be decoded.
    InvalidArgument,
    /// The call deadline passed before the handler ran.
    DeadlineExceeded,
    /// A server-side defect.
    Internal,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Canceled => "canceled",
            Code::Unknown => "unknown",
            Code::InvalidArgument => "invalid_argument",
            Code::DeadlineExceeded => "deadline_exceeded",
            Code::Internal => "internal",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
