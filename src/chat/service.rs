//! The `Say` handler.
//!
//! # Data Flow
//! ```text
//! SayRequest
//!     → cancellation / deadline check   (Canceled, DeadlineExceeded)
//!     → request validation              (InvalidRequest → invalid_argument)
//!     → "You said {sentence}" + timestamp
//!     → response validation             (InvalidResponse → internal)
//!     → SayResponse
//! ```

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::chat::types::{SayRequest, SayResponse};
use crate::rpc::{typed_unary, CallContext, RpcError, UnaryFunc};
use crate::validation::Validator;

/// Echo service with validation on both edges.
#[derive(Debug)]
pub struct ChatService {
    validator: Arc<Validator>,
    clock: MonotonicClock,
}

impl ChatService {
    pub fn new(validator: Arc<Validator>) -> Self {
        Self {
            validator,
            clock: MonotonicClock::default(),
        }
    }

    /// Echo `request.sentence` back as "You said ...".
    ///
    /// A request that fails validation never reaches the echo step; a reply
    /// that fails validation is never returned.
    pub async fn say(
        &self,
        ctx: &CallContext,
        request: SayRequest,
    ) -> Result<SayResponse, RpcError> {
        tracing::debug!(
            procedure = %ctx.procedure(),
            sentence = %request.sentence,
            "Received request for chat RPC"
        );

        ctx.check()?;

        self.validator
            .validate(&request)
            .into_result()
            .map_err(|invalid| {
                tracing::error!(error = %invalid, "Request failed validation");
                RpcError::InvalidRequest(invalid)
            })?;

        let response = SayResponse {
            sentence: format!("You said {}", request.sentence),
            responded_at: Some(self.clock.now()),
        };

        self.validator
            .validate(&response)
            .into_result()
            .map_err(|invalid| {
                tracing::error!(error = %invalid, "Response failed validation");
                RpcError::InvalidResponse(invalid)
            })?;

        Ok(response)
    }

    /// Type-erased handler for registration with the transport.
    pub fn into_unary(self: Arc<Self>) -> UnaryFunc {
        typed_unary(move |ctx: CallContext, request: SayRequest| {
            let service = Arc::clone(&self);
            async move { service.say(&ctx, request).await }
        })
    }
}

/// Wall clock that never goes backwards across calls.
#[derive(Debug, Default)]
struct MonotonicClock {
    last_micros: AtomicI64,
}

impl MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let candidate = Utc::now().timestamp_micros();
        let latest = self
            .last_micros
            .fetch_max(candidate, Ordering::SeqCst)
            .max(candidate);
        DateTime::from_timestamp_micros(latest).unwrap_or_else(Utc::now)
    }
}
