//! Static file serving module
//!
//! Fallback for GET paths with no registered endpoint: the file is read from
//! the archive or the static root and typed by its extension.

use crate::http::{self, mime};
use crate::resources::{ResourceError, ResourceLoader};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Serve a static resource at the normalized `path`
pub async fn serve(
    resources: &ResourceLoader,
    path: &str,
) -> Result<Response<Full<Bytes>>, ResourceError> {
    let resource = resources.load(path).await?;
    let content_type = mime::get_content_type(resource.extension());
    tracing::debug!(path, resolved = %resource.name, content_type, "serving static resource");
    Ok(http::build_ok_response(
        Bytes::from(resource.data),
        content_type,
    ))
}
