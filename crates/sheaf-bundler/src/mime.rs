//! Content types by file extension.

use std::path::Path;

/// Determine content type from file path.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext.to_ascii_lowercase().as_str() {
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "css" => "text/css",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "txt" => "text/plain",
        "map" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_types() {
        assert_eq!(content_type(Path::new("logo.PNG")), "image/png");
        assert_eq!(content_type(Path::new("js/index.js")), "application/javascript");
        assert_eq!(content_type(Path::new("pages/list.html")), "text/html");
        assert_eq!(content_type(Path::new("README")), "application/octet-stream");
    }
}
