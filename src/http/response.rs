//! HTTP response building module
//!
//! Builders for the few responses the dispatcher produces.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Build 200 OK response carrying an encoded reply or a static file
pub fn build_ok_response(body: Bytes, content_type: &str) -> Response<Full<Bytes>> {
    let content_length = body.len();
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build plaintext error response with a diagnostic message
pub fn build_error_response(status: StatusCode, message: String) -> Response<Full<Bytes>> {
    let content_length = message.len();
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(Bytes::from(message)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = status;
            fallback
        })
}

/// Build 501 Not Implemented response for unsupported methods
pub fn build_501_response(method: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_IMPLEMENTED)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, POST, DELETE")
        .body(Full::new(Bytes::from(format!(
            "501 Not Implemented: unsupported method ({method})"
        ))))
        .unwrap_or_else(|e| {
            log_build_error("501", &e);
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = StatusCode::NOT_IMPLEMENTED;
            fallback
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_ok_response_headers() {
        let response = build_ok_response(Bytes::from_static(b"{}\n"), "application/json");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["Content-Type"], "application/json");
        assert_eq!(response.headers()["Content-Length"], "3");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"{}\n");
    }

    #[test]
    fn test_error_response_status() {
        let response = build_error_response(StatusCode::BAD_REQUEST, "bad".to_string());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["Content-Type"],
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_501_response() {
        let response = build_501_response("PUT");
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(response.headers()["Allow"], "GET, POST, DELETE");
    }
}
