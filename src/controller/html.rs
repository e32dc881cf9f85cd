//! HTML helpers
//!
//! Small string builders for the generated pages. Values taken from the
//! definitions file are escaped before they land in markup or script.

/// Wrap `body` in a full HTML document
pub fn html_wrap(title: &str, head: &str, body: &str, bootstrap: bool) -> String {
    if bootstrap {
        format!(
            r#"<html>
    <head>
        <meta charset="utf-8"/>
        <meta http-equiv="X-UA-Compatible" content="IE=edge">
        <meta name="viewport" content="width=device-width, initial-scale=1">

        <title>{title}</title>

        <link rel="stylesheet" href="https://stackpath.bootstrapcdn.com/bootstrap/4.3.1/css/bootstrap.min.css">
        {head}
    </head>
    <body>
    {body}
    <script src="https://code.jquery.com/jquery-1.12.4.min.js" crossorigin="anonymous"></script>
    <script src="https://stackpath.bootstrapcdn.com/bootstrap/4.3.1/js/bootstrap.min.js"></script>
    </body>
</html>
"#
        )
    } else {
        format!(
            r#"<html>
    <head>
        <meta charset="utf-8"/>
        <title>{title}</title>
        {head}
    </head>
    <body>
    {body}
    </body>
</html>
"#
        )
    }
}

/// One table row: a linked key followed by its cells, keyed by column
pub struct TableRow<'a> {
    pub key: &'a str,
    pub cells: Vec<(&'a str, String)>,
}

/// Render rows as a bordered table with a title row and column headings.
///
/// The first column is the row key rendered as a link. A row lacking one of
/// `column_keys` shows `key <name> missing` in that cell.
pub fn create_html_table(
    rows: &[TableRow<'_>],
    title: &str,
    column_titles: &[&str],
    column_keys: &[&str],
) -> String {
    let mut table = String::from(r#"<table border="1">"#);
    table.push_str(&format!("<tr><td>{}</td></tr>", escape(title)));
    if !column_titles.is_empty() {
        table.push_str(&format!("<tr><td>{}</td></tr>", column_titles.join("</td><td>")));
    }
    if !column_keys.is_empty() {
        for row in rows {
            table.push_str(&format!(
                r#"<tr><td><a href="{0}">{1}</a></td>"#,
                escape_attr(row.key),
                escape(row.key)
            ));
            for key in column_keys {
                let cell = row
                    .cells
                    .iter()
                    .find(|(name, _)| name == key)
                    .map_or_else(|| format!("key {key} missing"), |(_, value)| escape(value));
                table.push_str(&format!("<td>{cell}</td>"));
            }
            table.push_str("</tr>");
        }
    }
    table.push_str("</table>");
    table
}

/// Insert `text` right after the first occurrence of `marker`.
///
/// Returns `input` unchanged when the marker is absent.
pub fn insert_after(input: &str, marker: &str, text: &str) -> String {
    match input.find(marker) {
        Some(index) => {
            let split = index + marker.len();
            format!("{}{text}{}", &input[..split], &input[split..])
        }
        None => {
            tracing::warn!(marker, "template marker not found, nothing inserted");
            input.to_string()
        }
    }
}

/// Escape text for HTML element content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a double-quoted HTML attribute
pub fn escape_attr(text: &str) -> String {
    escape(text).replace('"', "&quot;").replace('\'', "&#39;")
}

/// Render `text` as a single-quoted JavaScript string literal
pub fn js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\x22"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '<' => out.push_str("\\x3C"),
            '>' => out.push_str("\\x3E"),
            '&' => out.push_str("\\x26"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_after_first_occurrence() {
        assert_eq!(
            insert_after("<a>|<a>", "<a>", "X"),
            "<a>X|<a>"
        );
    }

    #[test]
    fn test_insert_after_missing_marker() {
        assert_eq!(insert_after("<html></html>", "<nope>", "X"), "<html></html>");
    }

    #[test]
    fn test_create_html_table() {
        let rows = [
            TableRow {
                key: "api/sshcmd",
                cells: vec![("required", "deviceAddress".to_string())],
            },
            TableRow {
                key: "",
                cells: vec![("required", String::new()), ("optional", String::new())],
            },
        ];
        let table = create_html_table(
            &rows,
            "GET",
            &["Path", "Required keys", "Optional keys"],
            &["required", "optional"],
        );
        assert!(table.starts_with(r#"<table border="1"><tr><td>GET</td></tr>"#));
        assert!(table.contains("<tr><td>Path</td><td>Required keys</td><td>Optional keys</td></tr>"));
        assert!(table.contains(r#"<a href="api/sshcmd">api/sshcmd</a></td><td>deviceAddress</td><td>key optional missing</td>"#));
        assert!(table.ends_with("</table>"));
    }

    #[test]
    fn test_table_without_columns_has_no_rows() {
        let rows = [TableRow {
            key: "x",
            cells: Vec::new(),
        }];
        let table = create_html_table(&rows, "POST", &[], &[]);
        assert_eq!(table, r#"<table border="1"><tr><td>POST</td></tr></table>"#);
    }

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#":put "$[/system clock get time]""#), r"':put \x22$[/system clock get time]\x22'");
        assert_eq!(js_string("it's"), r"'it\'s'");
        assert_eq!(js_string("</script>"), r"'\x3C/script\x3E'");
    }

    #[test]
    fn test_html_wrap_variants() {
        let plain = html_wrap("T", r#"<base href="../">"#, "<p>b</p>", false);
        assert!(plain.contains("<title>T</title>"));
        assert!(plain.contains(r#"<base href="../">"#));
        assert!(!plain.contains("bootstrap"));
        assert!(html_wrap("T", "", "", true).contains("bootstrap.min.css"));
    }
}
