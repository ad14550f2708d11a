//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGINT everywhere, SIGTERM on Unix)
//! - Translate the first signal into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A handler that cannot be installed is logged and never fires; it does
//!   not shut the server down

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Resolves when SIGINT or SIGTERM arrives.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!(signal = "SIGINT", "Received shutdown signal"),
        () = terminate => tracing::info!(signal = "SIGTERM", "Received shutdown signal"),
    }
}

/// Trigger `shutdown` on the first SIGINT or SIGTERM.
///
/// The task ends on its own if shutdown is triggered some other way first.
pub fn spawn_signal_listener(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = shutdown_signal() => shutdown.trigger(),
            () = shutdown.wait() => {}
        }
    })
}
