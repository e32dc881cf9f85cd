//! Generated pages: the control panel, the API index and the file browser

use super::definitions::ControllerDefinitions;
use super::html::{self, TableRow};
use super::AppContext;
use crate::endpoint::{HandlerError, Registry};
use rand::RngExt;
use std::net::SocketAddr;

const TEMPLATE_PATH: &str = "html/index.html";
const GENERATED_NOTE: &str = "\n<!-- Generated by studiocontroller -->\n";

/// Upper bound of the random delay before a poller starts, in milliseconds
const POLLER_JITTER_MS: u64 = 5000;

/// Fill the index template with the current time, pollers, fields and buttons
pub async fn render_index_page(ctx: &AppContext) -> Result<String, HandlerError> {
    let template = ctx
        .resources
        .load_text(TEMPLATE_PATH)
        .await
        .map_err(|e| HandlerError::with_source(format!("couldn't load {TEMPLATE_PATH}"), e))?;
    let defs = &ctx.definitions;

    let now = chrono::Local::now().format("%H:%M:%S").to_string();
    let page = html::insert_after(&template, "<currentTime>", &now);
    let page = html::insert_after(
        &page,
        "##INSERT_POLLERS",
        &format!("{GENERATED_NOTE}{}", poller_script(defs)),
    );
    let page = html::insert_after(
        &page,
        "<statusFields>",
        &format!("{GENERATED_NOTE}{}", status_table(defs)),
    );
    Ok(html::insert_after(
        &page,
        "<routerSelectors>",
        &format!("{GENERATED_NOTE}{}", buttons(defs)),
    ))
}

/// One delayed `setInterval(sendCmd, ...)` per polling status field
fn poller_script(defs: &ControllerDefinitions) -> String {
    let mut rng = rand::rng();
    let address = html::js_string(&defs.device_address);
    let username = html::js_string(&defs.device_ssh_username);
    defs.status_field_mappings
        .iter()
        .filter_map(|field| field.poller().map(|poller| (field, poller)))
        .map(|(field, (command, interval))| {
            let jitter = rng.random_range(0..=POLLER_JITTER_MS);
            format!(
                "\nwindow.setTimeout(function () {{ window.setInterval(sendCmd, {interval}, {address}, {username}, {}, {}); }}, {jitter});",
                html::js_string(command),
                html::js_string(&field.id),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_table(defs: &ControllerDefinitions) -> String {
    let rows = defs
        .status_field_mappings
        .iter()
        .map(|field| {
            format!(
                r#"<tr><td>{}</td><td style="min-width:200px" id="{}">&nbsp;</td></tr>"#,
                html::escape(&field.label),
                html::escape_attr(&field.id),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(r#"<table border="1"> {rows}</table>"#)
}

fn buttons(defs: &ControllerDefinitions) -> String {
    let address = html::js_string(&defs.device_address);
    let username = html::js_string(&defs.device_ssh_username);
    defs.button_script_mappings
        .iter()
        .map(|button| {
            let target = button
                .response_field_id
                .as_deref()
                .map_or_else(|| "undefined".to_string(), html::js_string);
            format!(
                r#"<button onclick="sendCmd({address}, {username}, {}, {target})">{}</button>"#,
                html::js_string(&button.target_cmd_string),
                html::escape(&button.label),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One table per method listing path, required keys and optional keys
pub fn list_endpoints(registry: &Registry) -> String {
    let tables: Vec<String> = registry
        .tables()
        .iter()
        .map(|(method, table)| {
            let rows: Vec<TableRow<'_>> = table
                .iter()
                .map(|descriptor| TableRow {
                    key: &descriptor.path,
                    cells: vec![
                        ("reqKeys", format!("{:?}", descriptor.required_keys)),
                        ("optKeys", format!("{:?}", descriptor.optional_keys)),
                    ],
                })
                .collect();
            html::create_html_table(
                &rows,
                method,
                &["Path", "Required keys", "Optional keys"],
                &["reqKeys", "optKeys"],
            )
        })
        .collect();
    format!("<h3>Available API endpoints:</h3>{}<br><br>", tables.join("<br><br>"))
}

pub fn render_api_index(listen_addr: SocketAddr, endpoint_listing: &str) -> String {
    let title = format!("Index page for studiocontroller API (@{listen_addr})");
    html::html_wrap(
        &title,
        "",
        &format!("<h1>{title}</h1>{endpoint_listing}"),
        true,
    )
}

/// Link every file of the static root and the archive
pub async fn browse_files(ctx: &AppContext) -> String {
    let local = ctx.resources.list_filesystem().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "couldn't list local files");
        Vec::new()
    });
    let archived = ctx.resources.list_archive().await.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "couldn't list archive files");
        Vec::new()
    });
    let archive_name = ctx
        .resources
        .archive()
        .map_or_else(|| "none".to_string(), |p| p.display().to_string());

    let body = format!(
        "<h1>Local file system ({})</h1>{}<br><h1>Archive file system ({})</h1>{}",
        html::escape(&ctx.resources.static_root().display().to_string()),
        file_links(&local),
        html::escape(&archive_name),
        file_links(&archived),
    );
    // Served below debug/, so links are re-rooted one level up
    html::html_wrap("File browser", r#"<base href="../">"#, &body, true)
}

fn file_links(files: &[String]) -> String {
    let rows: String = files
        .iter()
        .map(|file| {
            format!(
                r#"<tr><td><a href="{}">{}</a></td></tr>"#,
                html::escape_attr(file),
                html::escape(file)
            )
        })
        .collect();
    format!("<table>{rows}</table>")
}
