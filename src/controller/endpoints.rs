//! Endpoint tables of the control panel

use super::pages;
use super::AppContext;
use crate::endpoint::{
    handler_fn, sync_handler, ContentType, EndpointDescriptor, HandlerError, Invocation, Registry,
    Reply,
};
use std::net::SocketAddr;
use std::sync::Arc;

/// Build the GET, POST and DELETE tables.
///
/// POST and DELETE carry no endpoints; requests to them always miss.
pub fn build_registry(ctx: &Arc<AppContext>) -> Registry {
    let mut registry = Registry::new();

    let index_ctx = Arc::clone(ctx);
    registry.get.add_endpoint(
        "",
        EndpointDescriptor::new(handler_fn(move |_| {
            let ctx = Arc::clone(&index_ctx);
            async move { pages::render_index_page(&ctx).await.map(Reply::Text) }
        }))
        .content_type(ContentType::Html),
    );

    // Holds the slot; replaced below once the listing covers every endpoint
    registry
        .get
        .add_endpoint("api", api_index(ctx.listen_addr, String::new()));

    let ssh_ctx = Arc::clone(ctx);
    registry.get.add_endpoint(
        "api/sshcmd",
        EndpointDescriptor::new(handler_fn(move |inv| {
            let ctx = Arc::clone(&ssh_ctx);
            async move { send_command(&ctx, &inv).await }
        }))
        .required(["deviceAddress", "username", "commandString"])
        .content_type(ContentType::Html),
    );

    let browse_ctx = Arc::clone(ctx);
    registry.get.add_endpoint(
        "debug/browsefiles",
        EndpointDescriptor::new(handler_fn(move |_| {
            let ctx = Arc::clone(&browse_ctx);
            async move { Ok::<_, HandlerError>(Reply::Text(pages::browse_files(&ctx).await)) }
        }))
        .content_type(ContentType::Html),
    );

    let listing = pages::list_endpoints(&registry);
    registry
        .get
        .add_endpoint("api", api_index(ctx.listen_addr, listing));
    registry
}

/// API index page over a pre-rendered endpoint listing
fn api_index(listen_addr: SocketAddr, listing: String) -> EndpointDescriptor {
    EndpointDescriptor::new(sync_handler(move |_| {
        Ok(Reply::Text(pages::render_api_index(listen_addr, &listing)))
    }))
    .content_type(ContentType::Html)
}

/// Run a command on a device and return its output as text
async fn send_command(ctx: &AppContext, inv: &Invocation) -> Result<Reply, HandlerError> {
    let host = inv.text(0)?;
    let username = inv.text(1)?;
    let command = inv.text(2)?;

    let stdout = ctx
        .runner
        .run(&host, &username, &command, ctx.ssh_timeout)
        .await
        .map_err(|e| HandlerError::with_source("ssh command failed", e))?;
    String::from_utf8(stdout)
        .map(Reply::Text)
        .map_err(|e| HandlerError::with_source("device response is not UTF-8", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::definitions::ControllerDefinitions;
    use crate::controller::test_support::{context, FakeRunner};
    use crate::endpoint::{ParsedArguments, Value};

    fn definitions() -> ControllerDefinitions {
        ControllerDefinitions {
            device_address: "10.0.0.1".to_string(),
            device_ssh_username: "admin".to_string(),
            status_field_mappings: Vec::new(),
            button_script_mappings: Vec::new(),
        }
    }

    fn sshcmd_args(host: &str) -> Invocation {
        Invocation::new(
            &[],
            ParsedArguments {
                positional: vec![
                    Value::from(host),
                    Value::from("admin"),
                    Value::from("/system identity print"),
                ],
                keyword: Vec::new(),
            },
        )
    }

    #[test]
    fn test_registered_paths() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(context(dir.path(), definitions(), FakeRunner::ok("")));
        let registry = build_registry(&ctx);

        let paths: Vec<&str> = registry.get.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["", "api", "api/sshcmd", "debug/browsefiles"]);
        assert!(registry.post.is_empty());
        assert!(registry.delete.is_empty());
        assert_eq!(
            registry.get.lookup("api/sshcmd").unwrap().required_keys,
            vec!["deviceAddress", "username", "commandString"]
        );
    }

    #[tokio::test]
    async fn test_api_index_lists_every_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(context(dir.path(), definitions(), FakeRunner::ok("")));
        let registry = build_registry(&ctx);

        let api = registry.get.lookup("api").unwrap();
        let Reply::Text(page) = (api.handler)(Invocation::default()).await.unwrap() else {
            panic!("expected text");
        };
        assert!(page.contains("Index page for studiocontroller API (@127.0.0.1:10000)"));
        assert!(page.contains(r#"<a href="debug/browsefiles">"#));
        assert!(page.contains(r#"<a href="api">api</a>"#));
        assert!(page.contains(r#"["deviceAddress", "username", "commandString"]"#));
        assert!(page.contains("<tr><td>POST</td></tr>"));
    }

    #[tokio::test]
    async fn test_sshcmd_returns_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::ok("MikroTik\n");
        let ctx = Arc::new(context(dir.path(), definitions(), runner.clone()));
        let registry = build_registry(&ctx);

        let sshcmd = registry.get.lookup("api/sshcmd").unwrap();
        let reply = (sshcmd.handler)(sshcmd_args("192.168.88.1")).await.unwrap();
        assert_eq!(reply, Reply::Text("MikroTik\n".to_string()));
        assert_eq!(
            runner.calls(),
            vec!["admin@192.168.88.1 /system identity print".to_string()]
        );
    }

    #[tokio::test]
    async fn test_sshcmd_forwards_coerced_booleans_capitalized() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::ok("");
        let ctx = Arc::new(context(dir.path(), definitions(), runner.clone()));
        let registry = build_registry(&ctx);

        let sshcmd = registry.get.lookup("api/sshcmd").unwrap();
        let inv = Invocation::new(
            &[],
            ParsedArguments {
                positional: vec![Value::from("10.0.0.1"), Value::from("admin"), Value::Bool(true)],
                keyword: Vec::new(),
            },
        );
        (sshcmd.handler)(inv).await.unwrap();
        assert_eq!(runner.calls(), vec!["admin@10.0.0.1 True".to_string()]);
    }

    #[tokio::test]
    async fn test_sshcmd_failure() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(context(dir.path(), definitions(), FakeRunner::failing()));
        let registry = build_registry(&ctx);

        let sshcmd = registry.get.lookup("api/sshcmd").unwrap();
        let err = (sshcmd.handler)(sshcmd_args("10.9.9.9")).await.unwrap_err();
        assert!(err.to_string().starts_with("ssh command failed"));
    }
}
