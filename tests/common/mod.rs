//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{routing::get, Router};
use chat_rpc::config::ServerConfig;
use chat_rpc::{chat_router, ServerLifecycle, Shutdown};
use chat_sdk::ChatClient;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// A server started on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub lifecycle: ServerLifecycle,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> ChatClient {
        ChatClient::with_client(&self.url(), http_client())
    }

    /// Wait until exactly `expected` requests are being served.
    pub async fn wait_for_in_flight(&self, expected: u64) {
        let lifecycle = &self.lifecycle;
        tokio::time::timeout(Duration::from_secs(5), async {
            while lifecycle.in_flight() != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {expected} request(s) in flight, found {}",
                lifecycle.in_flight()
            )
        });
    }

    /// Trigger shutdown and wait for the drain to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        self.lifecycle
            .shutdown(Duration::from_secs(5))
            .await
            .expect("clean shutdown");
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

/// Start the chat service.
pub async fn start_chat_server() -> TestServer {
    start_server(chat_router(&test_config())).await
}

/// Start an arbitrary router under the lifecycle manager.
pub async fn start_server(router: Router) -> TestServer {
    let shutdown = Shutdown::new();
    let mut lifecycle = ServerLifecycle::new(router, shutdown.clone());
    let addr = lifecycle
        .start("127.0.0.1:0")
        .await
        .expect("server should start");
    TestServer {
        addr,
        lifecycle,
        shutdown,
    }
}

/// A router with one slow endpoint, for drain tests.
pub fn slow_router(delay: Duration) -> Router {
    Router::new().route(
        "/slow",
        get(move || async move {
            tokio::time::sleep(delay).await;
            "done"
        }),
    )
}

/// HTTP client that never goes through a proxy.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("client should build")
}

/// Log events captured from targets under a prefix.
///
/// Installed as the thread default, so it sees server tasks only on a
/// current-thread runtime.
#[derive(Clone)]
pub struct LogCapture {
    prefix: &'static str,
    events: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl LogCapture {
    pub fn install(prefix: &'static str) -> (Self, DefaultGuard) {
        let capture = Self {
            prefix,
            events: Arc::default(),
        };
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        (capture, tracing::subscriber::set_default(subscriber))
    }

    /// Captured events whose message is `message`, as field maps.
    pub fn with_message(&self, message: &str) -> Vec<HashMap<String, String>> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|fields| fields.get("message").map(String::as_str) == Some(message))
            .cloned()
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with(self.prefix) {
            return;
        }
        let mut fields = Fields::default();
        event.record(&mut fields);
        self.events.lock().unwrap().push(fields.0);
    }
}

#[derive(Default)]
struct Fields(HashMap<String, String>);

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}
