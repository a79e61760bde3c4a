//! Graceful shutdown signal for the service binaries.

use tokio::signal;

/// Resolves when the process should shut down (SIGTERM or ctrl-c).
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to create SIGTERM signal handler");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = signal::ctrl_c() => {}
        }
    }
    #[cfg(not(unix))]
    {
        drop(signal::ctrl_c().await);
    }
}
