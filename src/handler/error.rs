//! Dispatch error taxonomy
//!
//! Every way a request can fail before a 200 is sent, grouped into kinds that
//! the configured [`ErrorStatusMode`] maps onto HTTP status codes.

use crate::config::ErrorStatusMode;
use crate::endpoint::{ArgumentError, EncodeError, HandlerError};
use crate::resources::ResourceError;
use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no endpoint registered for '{0}'")]
    UnknownPath(String),
    #[error("{source}")]
    StaticMiss {
        path: String,
        source: ResourceError,
    },
    #[error(transparent)]
    Arguments(#[from] ArgumentError),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error(transparent)]
    Encoding(#[from] EncodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RoutingMiss,
    Validation,
    Handler,
    Encoding,
}

impl DispatchError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownPath(_) | Self::StaticMiss { .. } => ErrorKind::RoutingMiss,
            Self::Arguments(_) | Self::MalformedRequest(_) => ErrorKind::Validation,
            Self::Handler(_) => ErrorKind::Handler,
            Self::Encoding(_) => ErrorKind::Encoding,
        }
    }

    pub const fn status(&self, mode: ErrorStatusMode) -> StatusCode {
        match mode {
            ErrorStatusMode::Legacy => StatusCode::NOT_FOUND,
            ErrorStatusMode::Distinct => match self.kind() {
                ErrorKind::RoutingMiss => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Handler | ErrorKind::Encoding => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}
