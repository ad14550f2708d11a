//! Chat RPC server (v1)
//!
//! Serves `chat.v1.ChatService/Say` over a JSON transport built on Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net listener ─▶ http server ─▶ interceptor chain ─▶ ChatService::say
//!                                      (decode)        (logging)           (validate in/out)
//!     Client Response
//!     ◀────────────── http server ◀── interceptor chain ◀──────────────── SayResponse / RpcError
//!
//!     Cross-cutting: config, observability, lifecycle (signals, drain, exit code)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use chat_rpc::config::{load_config, validate_config, ConfigError, LoggingConfig, ServerConfig};
use chat_rpc::lifecycle::{spawn_signal_listener, ServerLifecycle, Shutdown, EXIT_FAILURE, EXIT_OK};
use chat_rpc::observability::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "chat-server")]
#[command(about = "Unary chat RPC server with request validation", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (host:port)
    #[arg(short, long)]
    bind: Option<String>,

    /// Override how long shutdown waits for in-flight calls
    #[arg(long)]
    shutdown_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load(&args) {
        Ok(config) => config,
        Err(e) => {
            if init_logging(&LoggingConfig::default()).is_err() {
                eprintln!("Failed to load configuration: {}", e);
            }
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "chat-server starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        call_timeout_secs = config.timeouts.call_secs,
        shutdown_timeout_secs = config.timeouts.shutdown_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let _signals = spawn_signal_listener(shutdown.clone());

    let mut lifecycle = ServerLifecycle::new(chat_rpc::chat_router(&config), shutdown);
    if let Err(e) = lifecycle.start(&config.listener.bind_address).await {
        tracing::error!(error = %e, "Startup failed");
        return ExitCode::from(e.exit_code());
    }

    lifecycle.await_shutdown_signal().await;
    tracing::info!("Shutting down server...");

    match lifecycle.shutdown(config.timeouts.shutdown()).await {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(e) => ExitCode::from(e.exit_code()),
    }
}

/// File (or defaults), then command-line overrides, then validation.
fn load(args: &Args) -> Result<ServerConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(secs) = args.shutdown_timeout_secs {
        config.timeouts.shutdown_secs = secs;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
