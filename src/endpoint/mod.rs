//! Endpoint registry
//!
//! Maps request paths to handler descriptors, one table per HTTP method.
//! Tables are built once at startup and shared read-only by every request.

pub mod args;
pub mod reply;
pub mod value;

use hyper::Method;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

pub use args::{ArgumentError, ParsedArguments};
pub use reply::{EncodeError, Reply};
pub use value::Value;

/// Declared encoding of an endpoint's reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Html,
    Text,
    /// Opaque pre-serialized bytes
    Raw,
}

impl ContentType {
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Html => "text/html",
            Self::Text => "text/plain",
            Self::Raw => "application/octet-stream",
        }
    }
}

/// Failure raised by a handler
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("missing positional argument {0}")]
    MissingArgument(usize),
    #[error("{0}")]
    Failed(String),
    #[error("{context}: {source}")]
    Source {
        context: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl HandlerError {
    pub fn with_source(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Source {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Arguments passed to a handler: preset values followed by the required
/// key values, plus the optional keys that were supplied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    pub args: Vec<Value>,
    pub kwargs: Vec<(String, Value)>,
}

impl Invocation {
    pub fn new(preset: &[Value], parsed: ParsedArguments) -> Self {
        let mut args = preset.to_vec();
        args.extend(parsed.positional);
        Self {
            args,
            kwargs: parsed.keyword,
        }
    }

    pub fn arg(&self, index: usize) -> Result<&Value, HandlerError> {
        self.args
            .get(index)
            .ok_or(HandlerError::MissingArgument(index))
    }

    /// Positional argument rendered as text, whatever it was coerced to
    pub fn text(&self, index: usize) -> Result<String, HandlerError> {
        self.arg(index).map(ToString::to_string)
    }

    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Reply, HandlerError>> + Send>>;

/// Type-erased endpoint target
pub type Handler = Arc<dyn Fn(Invocation) -> HandlerFuture + Send + Sync>;

/// Wrap an async closure as a [`Handler`]
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
{
    Arc::new(move |invocation| -> HandlerFuture { Box::pin(f(invocation)) })
}

/// Wrap a synchronous closure as a [`Handler`]
pub fn sync_handler<F>(f: F) -> Handler
where
    F: Fn(Invocation) -> Result<Reply, HandlerError> + Send + Sync + 'static,
{
    Arc::new(move |invocation| -> HandlerFuture {
        let result = f(invocation);
        Box::pin(async move { result })
    })
}

/// How a registered path maps to its handler
#[derive(Clone)]
pub struct EndpointDescriptor {
    pub path: String,
    pub handler: Handler,
    pub preset_args: Vec<Value>,
    pub required_keys: Vec<String>,
    pub optional_keys: Vec<String>,
    /// `None` means JSON-encode whatever the handler returns
    pub content_type: Option<ContentType>,
}

impl EndpointDescriptor {
    pub fn new(handler: Handler) -> Self {
        Self {
            path: String::new(),
            handler,
            preset_args: Vec::new(),
            required_keys: Vec::new(),
            optional_keys: Vec::new(),
            content_type: None,
        }
    }

    #[must_use]
    pub fn preset_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.preset_args = args.into_iter().collect();
        self
    }

    #[must_use]
    pub fn required<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.required_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn optional<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.optional_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }
}

impl fmt::Debug for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDescriptor")
            .field("path", &self.path)
            .field("preset_args", &self.preset_args)
            .field("required_keys", &self.required_keys)
            .field("optional_keys", &self.optional_keys)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Strip a single leading slash; `/` and anything not starting with a slash
/// normalize to the empty (index) path.
pub fn normalize_path(path: &str) -> &str {
    match path.strip_prefix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => "",
    }
}

/// Path → descriptor table for one HTTP method, in registration order
#[derive(Debug, Default, Clone)]
pub struct EndpointTable {
    endpoints: Vec<EndpointDescriptor>,
    index: HashMap<String, usize>,
}

impl EndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor` at `path`, replacing any earlier registration
    pub fn add_endpoint(&mut self, path: &str, mut descriptor: EndpointDescriptor) {
        let path = normalize_path_key(path);
        descriptor.path.clone_from(&path);
        if let Some(&slot) = self.index.get(&path) {
            self.endpoints[slot] = descriptor;
        } else {
            self.index.insert(path, self.endpoints.len());
            self.endpoints.push(descriptor);
        }
    }

    /// Exact, case-sensitive lookup of an already normalized path
    pub fn lookup(&self, path: &str) -> Option<&EndpointDescriptor> {
        self.index.get(path).map(|&slot| &self.endpoints[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Registration paths may be written with or without the leading slash
fn normalize_path_key(path: &str) -> String {
    if path.starts_with('/') {
        normalize_path(path).to_string()
    } else {
        path.to_string()
    }
}

/// One endpoint table per supported HTTP method
#[derive(Debug, Default, Clone)]
pub struct Registry {
    pub get: EndpointTable,
    pub post: EndpointTable,
    pub delete: EndpointTable,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for `method`, or `None` for methods the dispatcher does not serve
    pub fn table(&self, method: &Method) -> Option<&EndpointTable> {
        match *method {
            Method::GET => Some(&self.get),
            Method::POST => Some(&self.post),
            Method::DELETE => Some(&self.delete),
            _ => None,
        }
    }

    /// `(method name, table)` pairs in a fixed order
    pub fn tables(&self) -> [(&'static str, &EndpointTable); 3] {
        [("GET", &self.get), ("POST", &self.post), ("DELETE", &self.delete)]
    }
}
