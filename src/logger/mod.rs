//! Logger module
//!
//! Sets up `tracing` output to stdout and to a size-rotated log file, and
//! provides helpers for the server lifecycle, request failures and access
//! log lines.

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::RotatingFileWriter;

use crate::config::{AccessLogFormat, Settings};
use std::fmt;
use std::io;
use std::net::SocketAddr;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Local time as `dd/mm/yy HH:MM:SS`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

/// Initialize the global subscriber with configuration
///
/// Should be called once at application startup. `RUST_LOG` takes precedence
/// over `logging.level`.
pub fn init(settings: &Settings) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_timer(LocalTime)
        .with_target(false);

    let file_layer = match settings.logging.log_file.as_deref() {
        Some(path) => {
            let writer = RotatingFileWriter::open(path, settings.max_log_size_bytes())?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_timer(LocalTime)
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}

pub fn log_server_start(addr: &SocketAddr, settings: &Settings) {
    tracing::info!("======================================");
    tracing::info!("studiocontroller started");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Log level: {}", settings.logging.level);
    if let Some(workers) = settings.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some(ref path) = settings.logging.log_file {
        tracing::info!("Log file: {path}");
    }
    if let Some(ref archive) = settings.http.archive {
        tracing::info!("Resource archive: {archive}");
    }
    tracing::info!("Static root: {}", settings.http.static_root);
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log the diagnostic sent back for a failed request
pub fn log_request_failed(status: u16, diagnostic: &str) {
    tracing::warn!(status, "{diagnostic}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: AccessLogFormat) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

pub fn log_shutdown_requested(signal: &str) {
    tracing::info!("[Shutdown] {signal} received, stopping server");
}

pub fn log_shutdown_complete() {
    tracing::info!("[Shutdown] All connections closed");
}

pub fn log_shutdown_timeout(remaining: usize) {
    tracing::warn!("[Shutdown] Timed out with {remaining} connection(s) still open");
}
