//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router with one POST route per procedure
//! - Wire up middleware (tracing)
//! - Decode requests, run the interceptor chain, encode replies
//!
//! # Design Decisions
//! - The interceptor chain is applied once per procedure when the router is built
//! - Requests that cannot be decoded are rejected before the chain runs, so
//!   they produce no per-call log records
//! - A call's cancellation token fires when the client goes away (the
//!   handler future is dropped)

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower_http::trace::TraceLayer;

use crate::chat::{self, ChatService, SayRequest, SayResponse};
use crate::config::ServerConfig;
use crate::http::request::{call_context, is_json};
use crate::message::{AnyMessage, Message};
use crate::rpc::{InterceptorChain, LoggingInterceptor, RpcError, UnaryFunc};

type Decoder = fn(&[u8]) -> Result<AnyMessage, RpcError>;
type Encoder = fn(AnyMessage) -> Result<Response, RpcError>;

/// A unary procedure: its path, its handler and its JSON codec.
#[derive(Clone)]
pub struct Procedure {
    path: &'static str,
    handler: UnaryFunc,
    decode: Decoder,
    encode: Encoder,
}

impl Procedure {
    /// Register `handler` under `path`, decoding `Req` and encoding `Resp` as JSON.
    pub fn unary<Req, Resp>(path: &'static str, handler: UnaryFunc) -> Self
    where
        Req: Message + DeserializeOwned,
        Resp: Message + Serialize,
    {
        Self {
            path,
            handler,
            decode: decode_json::<Req>,
            encode: encode_json::<Resp>,
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure").field("path", &self.path).finish()
    }
}

fn decode_json<Req: Message + DeserializeOwned>(body: &[u8]) -> Result<AnyMessage, RpcError> {
    let body = if body.is_empty() { b"{}".as_slice() } else { body };
    serde_json::from_slice::<Req>(body)
        .map(AnyMessage::new)
        .map_err(|e| RpcError::Malformed(format!("unmarshal request: {e}")))
}

fn encode_json<Resp: Message + Serialize>(reply: AnyMessage) -> Result<Response, RpcError> {
    let type_name = reply.type_name();
    let reply = reply.downcast::<Resp>().ok_or_else(|| {
        RpcError::internal(format!("unexpected response message type {type_name}"))
    })?;
    Ok(Json(reply).into_response())
}

/// Per-route state.
#[derive(Clone)]
struct Route {
    procedure: Arc<Procedure>,
    call_timeout: Duration,
    max_request_bytes: usize,
}

/// Builds the router serving a set of procedures behind one interceptor chain.
#[derive(Debug)]
pub struct RpcServer {
    procedures: Vec<Procedure>,
    interceptors: InterceptorChain,
    call_timeout: Duration,
    max_request_bytes: usize,
}

impl RpcServer {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            procedures: Vec::new(),
            interceptors: InterceptorChain::new(),
            call_timeout: config.timeouts.call(),
            max_request_bytes: config.listener.max_request_bytes,
        }
    }

    /// Set the interceptor chain wrapped around every procedure.
    pub fn with_interceptors(mut self, interceptors: InterceptorChain) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn register(mut self, procedure: Procedure) -> Self {
        self.procedures.push(procedure);
        self
    }

    /// Build the Axum router with all middleware layers.
    pub fn into_router(self) -> Router {
        let mut router = Router::new();
        for procedure in self.procedures {
            tracing::debug!(
                procedure = procedure.path,
                interceptors = self.interceptors.len(),
                "Registering procedure"
            );
            let route = Route {
                procedure: Arc::new(Procedure {
                    handler: self.interceptors.apply(procedure.handler.clone()),
                    ..procedure
                }),
                call_timeout: self.call_timeout,
                max_request_bytes: self.max_request_bytes,
            };
            router = router.route(route.procedure.path, post(serve_unary).with_state(route));
        }

        router.layer(TraceLayer::new_for_http())
    }
}

/// Router serving `chat.v1.ChatService` with the logging interceptor.
pub fn chat_router(config: &ServerConfig) -> Router {
    let service = Arc::new(ChatService::new(Arc::new(chat::validator())));

    RpcServer::new(config)
        .with_interceptors(InterceptorChain::new().with(LoggingInterceptor::new()))
        .register(Procedure::unary::<SayRequest, SayResponse>(
            chat::SAY_PROCEDURE,
            service.into_unary(),
        ))
        .into_router()
}

async fn serve_unary(State(route): State<Route>, request: Request<Body>) -> Response {
    let procedure = route.procedure.path;
    let (parts, body) = request.into_parts();

    if !is_json(&parts.headers) {
        tracing::warn!(procedure, "Rejected request with unsupported content type");
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported content type, expected application/json",
        )
            .into_response();
    }

    let ctx = match call_context(procedure, &parts, route.call_timeout) {
        Ok(ctx) => ctx,
        Err(err) => return reject(procedure, err),
    };

    let bytes = match to_bytes(body, route.max_request_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return reject(
                procedure,
                RpcError::Malformed(format!("failed to read request body: {e}")),
            )
        }
    };

    let message = match (route.procedure.decode)(&bytes) {
        Ok(message) => message,
        Err(err) => return reject(procedure, err),
    };

    let _cancel_on_drop = ctx.cancellation_token().clone().drop_guard();

    match (route.procedure.handler)(ctx, message).await {
        Ok(reply) => (route.procedure.encode)(reply).unwrap_or_else(IntoResponse::into_response),
        Err(err) => err.into_response(),
    }
}

fn reject(procedure: &str, err: RpcError) -> Response {
    tracing::warn!(procedure, error = %err, "Rejected request before dispatch");
    err.into_response()
}
