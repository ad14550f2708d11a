//! Per-call structured logging.
//!
//! # Responsibilities
//! - Emit one entry record before the call runs
//! - Emit one exit record once the outcome is known
//!
//! # Design Decisions
//! - The exit record lives in a drop guard: a call abandoned mid-flight still
//!   gets exactly one exit record, classified as canceled
//! - The outcome is passed through untouched

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::message::AnyMessage;
use crate::rpc::code::Code;
use crate::rpc::context::CallContext;
use crate::rpc::error::RpcError;
use crate::rpc::interceptor::{Interceptor, UnaryFunc, UnaryFuture};

/// Logs the start and the end of every call it wraps.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl LoggingInterceptor {
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for LoggingInterceptor {
    fn wrap(&self, next: UnaryFunc) -> UnaryFunc {
        Arc::new(move |ctx: CallContext, msg: AnyMessage| -> UnaryFuture {
            let next = Arc::clone(&next);
            Box::pin(async move {
                tracing::info!(
                    procedure = %ctx.procedure(),
                    user_agent = %ctx.user_agent(),
                    http_method = %ctx.http_method(),
                    peer = %ctx.peer(),
                    "start processing request"
                );

                let mut exit = ExitRecord::new(ctx.procedure());
                let result = next(ctx, msg).await;
                exit.emit(&result);
                result
            })
        })
    }
}

struct ExitRecord {
    procedure: String,
    started: Instant,
    emitted: bool,
}

impl ExitRecord {
    fn new(procedure: &str) -> Self {
        Self {
            procedure: procedure.to_string(),
            started: Instant::now(),
            emitted: false,
        }
    }

    fn emit(&mut self, result: &Result<AnyMessage, RpcError>) {
        self.emitted = true;
        let duration = self.started.elapsed();
        match result {
            Ok(_) => tracing::info!(
                procedure = %self.procedure,
                code = "ok",
                duration = ?duration,
                "finished"
            ),
            Err(err) => failed(&self.procedure, err.code(), duration, err),
        }
    }
}

impl Drop for ExitRecord {
    fn drop(&mut self) {
        if !self.emitted {
            failed(
                &self.procedure,
                Code::Canceled,
                self.started.elapsed(),
                &"call abandoned before completion",
            );
        }
    }
}

fn failed(procedure: &str, code: Code, duration: Duration, error: &dyn std::fmt::Display) {
    tracing::error!(
        procedure = %procedure,
        code = %code,
        duration = ?duration,
        error = %error,
        "finished with error"
    );
}
