// Connection handling module
// Serves a single TCP connection on its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Serve `stream` on a spawned task.
///
/// The task:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Serves HTTP/1.1 with the request handler
/// 3. Switches to a graceful shutdown when `shutdown` flips
/// 4. Decrements the connection counter when done
pub fn spawn_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    mut shutdown: watch::Receiver<bool>,
) {
    active_connections.fetch_add(1, Ordering::SeqCst);
    logger::log_connection_accepted(&peer_addr);

    tokio::spawn(async move {
        let local_addr = match stream.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                logger::log_error(&format!("Failed to read local address: {e}"));
                active_connections.fetch_sub(1, Ordering::SeqCst);
                return;
            }
        };
        let io = TokioIo::new(stream);

        let conn = http1::Builder::new().serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&state);
                handler::handle_request(req, state, peer_addr, local_addr)
            }),
        );
        tokio::pin!(conn);

        let result = tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown_requested(&mut shutdown) => {
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        };
        if let Err(err) = result {
            logger::log_connection_error(&err);
        }

        active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Resolves once the shutdown flag is set or its sender is gone
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
