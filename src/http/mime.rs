//! MIME type detection module
//!
//! Returns the Content-Type for a static resource based on its file extension.
//! Unknown extensions are served as HTML.

/// Get MIME Content-Type based on file extension
///
/// # Examples
/// ```
/// use studiocontroller::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("jpeg")), "image/jpeg");
/// assert_eq!(get_content_type(Some("ico")), "image/x-icon");
/// assert_eq!(get_content_type(None), "text/html");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    let lowered = extension.map(str::to_ascii_lowercase);
    match lowered.as_deref() {
        // Text
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("txt" | "md" | "log") => "text/plain",

        // Scripts and data
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        Some("zip") => "application/zip",

        _ => "text/html",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(get_content_type(Some("html")), "text/html");
        assert_eq!(get_content_type(Some("jpeg")), "image/jpeg");
        assert_eq!(get_content_type(Some("ico")), "image/x-icon");
        assert_eq!(get_content_type(Some("css")), "text/css");
        assert_eq!(get_content_type(Some("json")), "application/json");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(get_content_type(Some("JPG")), "image/jpeg");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(get_content_type(Some("xyz")), "text/html");
        assert_eq!(get_content_type(None), "text/html");
    }
}
