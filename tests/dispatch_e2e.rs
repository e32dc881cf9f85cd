use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use studiocontroller::config::{AppState, ErrorStatusMode, Settings};
use studiocontroller::endpoint::{sync_handler, ContentType, EndpointDescriptor, Registry, Reply};
use studiocontroller::handler::Dispatcher;
use studiocontroller::resources::ResourceLoader;
use studiocontroller::server::{self, ServerError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop")
            .unwrap();
        assert!(result.is_ok());
    }
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.get.add_endpoint(
        "api/hello",
        EndpointDescriptor::new(sync_handler(|inv| {
            Ok(Reply::Text(format!("hello {}", inv.text(0)?)))
        }))
        .required(["name"])
        .content_type(ContentType::Text),
    );
    registry.post.add_endpoint(
        "api/run",
        EndpointDescriptor::new(sync_handler(|inv| {
            Ok(Reply::Value(serde_json::json!({ "cmd": inv.text(0)? })))
        }))
        .required(["cmd"]),
    );
    registry
}

async fn start(static_root: &Path, archive: Option<&Path>, mode: ErrorStatusMode) -> TestServer {
    let settings = Settings::load_from("/nonexistent/studiocontroller-test").unwrap();
    let listener = server::create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();

    let resources = ResourceLoader::new(
        archive.map(Path::to_path_buf),
        static_root,
        vec!["index.html".to_string()],
    );
    let dispatcher = Dispatcher::new(
        Arc::new(registry()),
        Arc::new(resources),
        mode,
        format!("PublicHTTP({})", addr.port()),
    );
    let state = Arc::new(AppState::new(settings, dispatcher));

    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(server::serve(
        listener,
        state,
        shutdown_rx,
        Duration::from_secs(2),
    ));
    TestServer {
        addr,
        shutdown,
        task,
    }
}

/// Send a raw request and return (status, headers, body)
async fn send(addr: SocketAddr, method: &str, target: &str, body: &str) -> (u16, String, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();
    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    (status, head.to_lowercase(), body.to_string())
}

#[tokio::test]
async fn get_endpoint_with_required_key() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(dir.path(), None, ErrorStatusMode::Legacy).await;

    let (status, head, body) = send(server.addr, "GET", "/api/hello?name=studio", "").await;
    assert_eq!(status, 200);
    assert!(head.contains("content-type: text/plain"));
    assert_eq!(body, "hello studio");

    server.stop().await;
}

#[tokio::test]
async fn index_file_served_from_static_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>panel</h1>").unwrap();
    let server = start(dir.path(), None, ErrorStatusMode::Legacy).await;

    let (status, head, body) = send(server.addr, "GET", "/", "").await;
    assert_eq!(status, 200);
    assert!(head.contains("content-type: text/html"));
    assert_eq!(body, "<h1>panel</h1>");

    server.stop().await;
}

#[tokio::test]
async fn unknown_path_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(dir.path(), None, ErrorStatusMode::Legacy).await;

    let (status, _, body) = send(server.addr, "GET", "/nonexistent", "").await;
    assert_eq!(status, 404);
    assert!(body.starts_with(&format!("PublicHTTP({})", server.addr.port())));

    server.stop().await;
}

#[tokio::test]
async fn post_form_body() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(dir.path(), None, ErrorStatusMode::Legacy).await;

    let (status, head, body) = send(server.addr, "POST", "/api/run", "cmd=reboot").await;
    assert_eq!(status, 200);
    assert!(head.contains("content-type: application/json"));
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value, serde_json::json!({ "cmd": "reboot" }));

    let (status, _, body) = send(server.addr, "POST", "/api/run", "cmd=reboot&extra=1").await;
    assert_eq!(status, 404);
    assert!(body.contains("POST /api/run"));

    server.stop().await;
}

#[tokio::test]
async fn distinct_status_mode() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(dir.path(), None, ErrorStatusMode::Distinct).await;

    let (status, _, _) = send(server.addr, "GET", "/api/hello", "").await;
    assert_eq!(status, 400);
    let (status, _, _) = send(server.addr, "GET", "/missing.css", "").await;
    assert_eq!(status, 404);

    server.stop().await;
}

#[tokio::test]
async fn unsupported_method_is_501() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(dir.path(), None, ErrorStatusMode::Legacy).await;

    let (status, head, _) = send(server.addr, "PUT", "/api/run", "").await;
    assert_eq!(status, 501);
    assert!(head.contains("allow: get, post, delete"));

    server.stop().await;
}

#[tokio::test]
async fn archive_takes_precedence_over_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("style.css"), "from disk").unwrap();
    std::fs::write(dir.path().join("only-disk.txt"), "disk only").unwrap();

    let archive = dir.path().join("bundle.zip");
    {
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&archive).unwrap());
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file("style.css", options).unwrap();
        writer.write_all(b"from archive").unwrap();
        writer.finish().unwrap();
    }
    let server = start(dir.path(), Some(&archive), ErrorStatusMode::Legacy).await;

    let (status, head, body) = send(server.addr, "GET", "/style.css", "").await;
    assert_eq!(status, 200);
    assert!(head.contains("content-type: text/css"));
    assert_eq!(body, "from archive");

    let (status, _, body) = send(server.addr, "GET", "/only-disk.txt", "").await;
    assert_eq!(status, 200);
    assert_eq!(body, "disk only");

    server.stop().await;
}
