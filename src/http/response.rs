//! Response handling: encoding call outcomes as HTTP responses.
//!
//! # Responsibilities
//! - Map error codes to HTTP statuses
//! - Encode errors as JSON `WireError` bodies

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::rpc::{Code, RpcError};

/// HTTP status for an error code. Canceled uses nginx's 499.
pub fn status_for(code: Code) -> StatusCode {
    match code {
        Code::Canceled => StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT),
        Code::Unknown | Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        (status_for(self.code()), Json(self.to_wire())).into_response()
    }
}
