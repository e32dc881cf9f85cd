//! Request handler module
//!
//! Adapts hyper requests to the endpoint dispatcher and writes access log
//! lines for the responses.

pub mod error;
pub mod router;
pub mod static_files;

pub use error::{DispatchError, ErrorKind};
pub use router::{Dispatcher, IncomingRequest};

use crate::config::AppState;
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let mut entry = state.settings.logging.access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            parts.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = format!("{:?}", parts.version)
            .trim_start_matches("HTTP/")
            .to_string();
        entry.referer = header_value(&parts.headers, "referer");
        entry.user_agent = header_value(&parts.headers, "user-agent");
        entry
    });

    let collected = body.collect().await.map(http_body_util::Collected::to_bytes);
    let incoming = IncomingRequest {
        method: parts.method,
        uri: parts.uri,
        content_length: header_value(&parts.headers, "content-length"),
        body: collected.as_ref().cloned().unwrap_or_default(),
        peer_addr,
        local_addr,
    };

    let response = match collected {
        Ok(_) => state.dispatcher.dispatch(&incoming).await,
        Err(e) => state.dispatcher.reject(
            &incoming,
            &DispatchError::MalformedRequest(format!("failed to read request body: {e}")),
        ),
    };

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, state.settings.logging.access_log_format);
    }

    Ok(response)
}

fn header_value(headers: &hyper::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
