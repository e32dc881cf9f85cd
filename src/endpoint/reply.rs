//! Handler replies and their wire encoding

use hyper::body::Bytes;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use super::ContentType;

/// What a handler hands back to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Bytes(Bytes),
    /// Structured data, JSON-encoded when the endpoint declares no content type
    Value(serde_json::Value),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{content_type} endpoint returned {found}, expected text")]
    ExpectedText {
        content_type: &'static str,
        found: &'static str,
    },
    #[error("{content_type} endpoint returned structured data, expected pre-encoded text or bytes")]
    ExpectedEncoded { content_type: &'static str },
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl Reply {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Value(_) => "structured data",
        }
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Reply {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(b))
    }
}

impl From<serde_json::Value> for Reply {
    fn from(v: serde_json::Value) -> Self {
        Self::Value(v)
    }
}

/// Encode a reply according to the endpoint's declared content type.
///
/// Returns the body and the `Content-Type` header value.
pub fn encode(
    reply: Reply,
    content_type: Option<ContentType>,
) -> Result<(Bytes, &'static str), EncodeError> {
    match content_type {
        Some(ct @ (ContentType::Html | ContentType::Text)) => match reply {
            Reply::Text(text) => Ok((Bytes::from(text), ct.mime())),
            Reply::Value(serde_json::Value::String(text)) => Ok((Bytes::from(text), ct.mime())),
            other => Err(EncodeError::ExpectedText {
                content_type: ct.mime(),
                found: other.kind(),
            }),
        },
        Some(ct @ (ContentType::Json | ContentType::Raw)) => match reply {
            Reply::Text(text) => Ok((Bytes::from(text), ct.mime())),
            Reply::Bytes(bytes) => Ok((bytes, ct.mime())),
            Reply::Value(_) => Err(EncodeError::ExpectedEncoded {
                content_type: ct.mime(),
            }),
        },
        None => {
            let value = match reply {
                Reply::Value(value) => value,
                Reply::Text(text) => serde_json::Value::String(text),
                Reply::Bytes(bytes) => {
                    serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
            };
            Ok((Bytes::from(to_pretty_json(&value)?), ContentType::Json.mime()))
        }
    }
}

/// JSON with 4-space indentation and a trailing newline, keys in given order
pub fn to_pretty_json(value: &serde_json::Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}
