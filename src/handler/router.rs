//! Request dispatch module
//!
//! Looks up the endpoint registered for the request's method and path, turns
//! the payload into handler arguments, runs the handler and encodes its reply.
//! GET requests with no registered endpoint fall back to static resources.

use crate::config::ErrorStatusMode;
use crate::endpoint::{
    args, normalize_path, reply, EndpointDescriptor, Invocation, Registry,
};
use crate::handler::error::DispatchError;
use crate::handler::static_files;
use crate::http;
use crate::logger;
use crate::resources::ResourceLoader;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, Uri};
use std::net::SocketAddr;
use std::sync::Arc;

/// A fully read request, detached from the connection it arrived on
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub uri: Uri,
    /// Raw `Content-Length` header value, if any
    pub content_length: Option<String>,
    pub body: Bytes,
    pub peer_addr: SocketAddr,
    pub local_addr: SocketAddr,
}

impl IncomingRequest {
    /// Path and query exactly as requested
    pub fn raw_path(&self) -> &str {
        self.uri
            .path_and_query()
            .map_or_else(|| self.uri.path(), |pq| pq.as_str())
    }
}

/// Routes requests through the endpoint registry
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    resources: Arc<ResourceLoader>,
    error_status: ErrorStatusMode,
    server_name: String,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        resources: Arc<ResourceLoader>,
        error_status: ErrorStatusMode,
        server_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            resources,
            error_status,
            server_name: server_name.into(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Produce the response for `req`; never fails
    pub async fn dispatch(&self, req: &IncomingRequest) -> Response<Full<Bytes>> {
        if self.registry.table(&req.method).is_none() {
            logger::log_warning(&format!("Method not implemented: {}", req.method));
            return http::build_501_response(req.method.as_str());
        }

        match self.try_dispatch(req).await {
            Ok(response) => response,
            Err(err) => self.reject(req, &err),
        }
    }

    /// Turn a dispatch failure into the plaintext diagnostic response
    pub fn reject(&self, req: &IncomingRequest, err: &DispatchError) -> Response<Full<Bytes>> {
        let status = err.status(self.error_status);
        let message = format!(
            "{}(server: {}, client: {}) {} {}, {err}",
            self.server_name,
            req.local_addr,
            req.peer_addr,
            req.method,
            req.raw_path(),
        );
        logger::log_request_failed(status.as_u16(), &message);
        http::build_error_response(status, message)
    }

    async fn try_dispatch(&self, req: &IncomingRequest) -> Result<Response<Full<Bytes>>, DispatchError> {
        let payload = match req.method {
            Method::GET => req.uri.query().unwrap_or_default().to_string(),
            _ => body_payload(req.content_length.as_deref(), &req.body)?,
        };
        let path = normalize_path(req.uri.path());

        let descriptor = self
            .registry
            .table(&req.method)
            .and_then(|table| table.lookup(path));

        match descriptor {
            Some(descriptor) => invoke(descriptor, &payload).await,
            None if req.method == Method::GET => static_files::serve(&self.resources, path)
                .await
                .map_err(|source| DispatchError::StaticMiss {
                    path: path.to_string(),
                    source,
                }),
            None => Err(DispatchError::UnknownPath(path.to_string())),
        }
    }
}

/// Run one endpoint against a raw `key=value&...` payload
async fn invoke(
    descriptor: &EndpointDescriptor,
    payload: &str,
) -> Result<Response<Full<Bytes>>, DispatchError> {
    let coerced = args::coerce_query(payload);
    let parsed = args::split_arguments(
        coerced,
        &descriptor.required_keys,
        &descriptor.optional_keys,
    )?;
    let invocation = Invocation::new(&descriptor.preset_args, parsed);

    let reply = (descriptor.handler)(invocation).await?;
    let (body, content_type) = reply::encode(reply, descriptor.content_type)?;
    Ok(http::build_ok_response(body, content_type))
}

/// Body bytes up to the declared length, decoded as UTF-8.
///
/// A missing or unparseable `Content-Length` reads nothing.
fn body_payload(content_length: Option<&str>, body: &Bytes) -> Result<String, DispatchError> {
    let declared = content_length
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let bytes = &body[..declared.min(body.len())];
    std::str::from_utf8(bytes)
        .map(ToString::to_string)
        .map_err(|e| DispatchError::MalformedRequest(format!("request body is not UTF-8: {e}")))
}
