//! Output minification for stylesheets and pages.

use std::sync::LazyLock;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use regex::Regex;

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid regex"));

/// Group 1 is the element content, which is never touched
static RAW_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:pre|textarea|script|style)\b[^>]*>(.*?)</(?:pre|textarea|script|style)\s*>")
        .expect("valid regex")
});

/// Minify a stylesheet with lightningcss
pub fn minify_css(css: &str, filename: &str) -> Result<String, String> {
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..Default::default()
        },
    )
    .map_err(|e| e.to_string())?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| e.to_string())?;
    let out = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(out.code)
}

/// Strip comments and collapse whitespace between tags
///
/// Conditional comments and the contents of `pre`, `textarea`, `script` and
/// `style` are kept as written.
pub fn minify_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for caps in RAW_TEXT.captures_iter(html) {
        let Some(content) = caps.get(1) else {
            continue;
        };
        out.push_str(&collapse(&html[last..content.start()]));
        out.push_str(content.as_str());
        last = content.end();
    }
    out.push_str(&collapse(&html[last..]));
    out.trim().to_string()
}

fn collapse(markup: &str) -> String {
    let without_comments = HTML_COMMENT.replace_all(markup, |caps: &regex::Captures<'_>| {
        if caps[0].starts_with("<!--[if") {
            caps[0].to_string()
        } else {
            String::new()
        }
    });
    BETWEEN_TAGS
        .replace_all(&without_comments, "><")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_comments_and_gaps_are_removed() {
        let html = "<html>\n  <!-- note -->\n  <body>\n    <p>hi</p>\n  </body>\n</html>\n";
        assert_eq!(minify_html(html), "<html><body><p>hi</p></body></html>");
    }

    #[test]
    fn raw_text_is_preserved() {
        let html = "<div>\n  <pre>\n  a\n    b\n</pre>\n  <script>\n  var x = 1; <!-- y -->\n</script>\n</div>";
        let out = minify_html(html);
        assert!(out.contains("<pre>\n  a\n    b\n</pre>"));
        assert!(out.contains("<script>\n  var x = 1; <!-- y -->\n</script>"));
    }

    #[test]
    fn gaps_around_script_tags_are_removed() {
        let html = "<body>\n  <p>x</p>\n  <script src=\"a.js\"></script>\n  <script src=\"b.js\"></script>\n</body>\n";
        assert_eq!(
            minify_html(html),
            "<body><p>x</p><script src=\"a.js\"></script><script src=\"b.js\"></script></body>"
        );
    }

    #[test]
    fn gaps_before_style_and_pre_are_removed() {
        let html = "<head>\n  <style>\n a { color: red }\n</style>\n</head>\n<body>\n  <pre> x </pre>\n</body>";
        assert_eq!(
            minify_html(html),
            "<head><style>\n a { color: red }\n</style></head><body><pre> x </pre></body>"
        );
    }

    #[test]
    fn css_is_minified() {
        let css = ".nav a {\n  color: #ff0000;\n  margin: 0px 0px;\n}\n";
        let out = minify_css(css, "index.css").unwrap();
        assert!(out.starts_with(".nav a{"));
        assert!(out.contains("color:red"));
        assert!(!out.contains('\n'));
    }
}
