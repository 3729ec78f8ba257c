//! Output filename templates.
//!
//! Templates substitute bracketed placeholders: `[name]`, `[id]`, `[ext]` and
//! `[contenthash]` (optionally `[contenthash:N]` for an N-character prefix).

use sha2::{Digest, Sha256};

use crate::error::{ConfigError, Result};

const DEFAULT_HASH_LEN: usize = 8;

/// Values available while rendering a template
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVars<'a> {
    pub name: Option<&'a str>,
    pub id: Option<&'a str>,
    pub ext: Option<&'a str>,
    pub content: Option<&'a [u8]>,
}

impl<'a> TemplateVars<'a> {
    pub fn named(name: &'a str) -> Self {
        Self {
            name: Some(name),
            id: Some(name),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_ext(mut self, ext: &'a str) -> Self {
        self.ext = Some(ext);
        self
    }

    pub fn with_content(mut self, content: &'a [u8]) -> Self {
        self.content = Some(content);
        self
    }
}

enum Segment<'t> {
    Literal(&'t str),
    Name,
    Id,
    Ext,
    ContentHash(usize),
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>> {
    let invalid = |message: String| ConfigError::InvalidTemplate {
        template: template.to_string(),
        message,
    };

    let mut segments = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('[') {
        if open > 0 {
            segments.push(Segment::Literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after
            .find(']')
            .ok_or_else(|| invalid("unterminated placeholder".to_string()))?;
        let placeholder = &after[..close];
        segments.push(match placeholder.split_once(':') {
            None => match placeholder {
                "name" => Segment::Name,
                "id" => Segment::Id,
                "ext" => Segment::Ext,
                "contenthash" => Segment::ContentHash(DEFAULT_HASH_LEN),
                other => return Err(invalid(format!("unknown placeholder [{other}]"))),
            },
            Some(("contenthash", len)) => {
                let len = len
                    .parse::<usize>()
                    .ok()
                    .filter(|len| (1..=64).contains(len))
                    .ok_or_else(|| invalid(format!("invalid hash length '{len}'")))?;
                Segment::ContentHash(len)
            }
            Some(_) => return Err(invalid(format!("unknown placeholder [{placeholder}]"))),
        });
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

/// Check that a template only uses known placeholders
pub fn check_template(template: &str) -> Result<()> {
    if template.trim().is_empty() {
        return Err(ConfigError::InvalidTemplate {
            template: template.to_string(),
            message: "template is empty".to_string(),
        });
    }
    parse(template).map(|_| ())
}

/// Whether a template distinguishes outputs by name or id
pub fn is_distinguishing(template: &str) -> bool {
    parse(template).is_ok_and(|segments| {
        segments
            .iter()
            .any(|s| matches!(s, Segment::Name | Segment::Id | Segment::ContentHash(_)))
    })
}

/// Substitute placeholders
///
/// # Example
///
/// ```
/// use sheaf_config::{TemplateVars, render_template};
///
/// let vars = TemplateVars::named("list");
/// assert_eq!(render_template("js/[name].js", &vars).unwrap(), "js/list.js");
/// ```
pub fn render_template(template: &str, vars: &TemplateVars<'_>) -> Result<String> {
    let missing = |placeholder: &str| ConfigError::InvalidTemplate {
        template: template.to_string(),
        message: format!("[{placeholder}] has no value here"),
    };

    let mut out = String::with_capacity(template.len() + 16);
    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Name => out.push_str(vars.name.ok_or_else(|| missing("name"))?),
            Segment::Id => out.push_str(vars.id.ok_or_else(|| missing("id"))?),
            Segment::Ext => out.push_str(vars.ext.ok_or_else(|| missing("ext"))?),
            Segment::ContentHash(len) => {
                let content = vars.content.ok_or_else(|| missing("contenthash"))?;
                out.push_str(&content_hash(content)[..len]);
            }
        }
    }
    Ok(out)
}

/// Hex SHA-256 of `content`
pub fn content_hash(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_name_and_ext() {
        let vars = TemplateVars::named("logo").with_ext("png");
        assert_eq!(
            render_template("image/[name].[ext]", &vars).unwrap(),
            "image/logo.png"
        );
    }

    #[test]
    fn renders_content_hash_prefix() {
        let vars = TemplateVars::named("index").with_content(b"body{}");
        let full = render_template("[name].[contenthash].css", &vars).unwrap();
        let short = render_template("[name].[contenthash:4].css", &vars).unwrap();
        assert_eq!(full.len(), "index..css".len() + 8);
        assert_eq!(&full[..10], &short[..10]);
    }

    #[test]
    fn rejects_unknown_placeholder() {
        assert!(matches!(
            check_template("js/[chunkhash].js"),
            Err(ConfigError::InvalidTemplate { .. })
        ));
        assert!(check_template("js/[name.js").is_err());
        assert!(check_template("[contenthash:0].js").is_err());
    }

    #[test]
    fn missing_value_is_an_error() {
        let vars = TemplateVars::named("index");
        assert!(render_template("[name].[ext]", &vars).is_err());
    }

    #[test]
    fn detects_templates_that_collapse_outputs() {
        assert!(is_distinguishing("js/[name].js"));
        assert!(is_distinguishing("[id].css"));
        assert!(!is_distinguishing("bundle.js"));
    }
}
