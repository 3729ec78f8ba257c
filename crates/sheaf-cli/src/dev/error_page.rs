//! Page served in place of HTML while the last build is failing.
//!
//! The page loads the live reload client, so it goes away on the next
//! successful build.

use crate::dev::CLIENT_PATH;

/// Render the error page for a failed build.
pub fn render(error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Build failed - sheaf</title>
  <style>
    body {{ margin: 0; padding: 2rem; background: #1e1e1e; color: #f0f0f0; font-family: ui-monospace, monospace; }}
    h1 {{ color: #ff6b6b; font-size: 1.25rem; }}
    pre {{ white-space: pre-wrap; background: #2a2a2a; padding: 1rem; border-left: 4px solid #ff6b6b; }}
  </style>
</head>
<body>
  <h1>Build failed</h1>
  <pre>{}</pre>
  <p>Fix the error and save; this page reloads when the next build succeeds.</p>
  <script src="{}"></script>
</body>
</html>
"#,
        html_escape(error),
        CLIENT_PATH
    )
}

fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
