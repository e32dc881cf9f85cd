// Server loop module
// Accepts connections until shutdown, then waits a bounded time for them to finish

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::{shutdown_requested, spawn_connection};
use crate::config::AppState;
use crate::logger;

/// Interval at which the drain phase re-checks open connections
const DRAIN_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
    #[error("{remaining} connection(s) still open after {timeout:?}")]
    ShutdownTimeout { remaining: usize, timeout: Duration },
}

/// Serve connections from `listener` until `shutdown` is set.
///
/// Open connections are asked to finish gracefully and get
/// `shutdown_timeout` to do so.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
    shutdown_timeout: Duration,
) -> Result<(), ServerError> {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => spawn_connection(
                        stream,
                        peer_addr,
                        Arc::clone(&state),
                        Arc::clone(&active_connections),
                        shutdown.clone(),
                    ),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = shutdown_requested(&mut shutdown) => break,
        }
    }

    // Stop accepting before draining
    drop(listener);
    drain(&active_connections, shutdown_timeout).await
}

async fn drain(active_connections: &AtomicUsize, timeout: Duration) -> Result<(), ServerError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 {
            logger::log_shutdown_complete();
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_shutdown_timeout(remaining);
            return Err(ServerError::ShutdownTimeout { remaining, timeout });
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_without_connections() {
        let counter = AtomicUsize::new(0);
        assert!(drain(&counter, Duration::from_millis(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_drain_times_out() {
        let counter = AtomicUsize::new(2);
        let err = drain(&counter, Duration::from_millis(60)).await.unwrap_err();
        assert!(matches!(err, ServerError::ShutdownTimeout { remaining: 2, .. }));
    }
}
