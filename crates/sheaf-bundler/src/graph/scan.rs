//! Reference scanners.
//!
//! Scripts are parsed with oxc and their import forms collected from the AST
//! (`import`/`export ... from` declarations, `require()` calls with a string
//! argument and `import()` expressions). Stylesheets and HTML are scanned for
//! `url()` and `src` references.

use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    CallExpression, ExportAllDeclaration, ExportNamedDeclaration, Expression,
    ImportDeclaration, ImportExpression, Program,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};
use regex::{Captures, Regex};

use crate::{Error, Result};

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^'"()\s]+))\s*\)"#).expect("valid regex")
});

static HTML_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<(?:img|source|video|audio|input|track)\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#,
    )
    .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsImport {
    pub specifier: String,
    pub kind: ImportKind,
}

/// A reference inside CSS or HTML; `range` covers the URL text only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRef {
    pub range: Range<usize>,
    pub url: String,
}

/// Syntactic form of a module reference in a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Form {
    /// `import`, `export ... from`
    Declaration,
    /// `require('...')`
    Require,
    /// `import('...')`
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    /// The whole declaration or call
    pub span: Span,
    pub specifier: String,
    pub form: Form,
}

impl Reference {
    fn import(&self) -> JsImport {
        JsImport {
            specifier: self.specifier.clone(),
            kind: match self.form {
                Form::Dynamic => ImportKind::Dynamic,
                Form::Declaration | Form::Require => ImportKind::Static,
            },
        }
    }
}

/// Parse a script as an ES module
pub(crate) fn parse_script<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    path: &Path,
) -> Result<Program<'a>> {
    let parsed = Parser::new(allocator, source, SourceType::mjs()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(Error::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }
    Ok(parsed.program)
}

/// Collects module references anywhere in a program, in source order
#[derive(Debug, Default)]
pub(crate) struct ReferenceCollector {
    references: Vec<Reference>,
}

impl ReferenceCollector {
    pub(crate) fn collect(program: &Program<'_>) -> Vec<Reference> {
        let mut collector = Self::default();
        collector.visit_program(program);
        collector.references.sort_by_key(|r| r.span.start);
        collector.references
    }

    fn push(&mut self, span: Span, specifier: &str, form: Form) {
        self.references.push(Reference {
            span,
            specifier: specifier.to_string(),
            form,
        });
    }
}

impl<'a> Visit<'a> for ReferenceCollector {
    fn visit_import_declaration(&mut self, it: &ImportDeclaration<'a>) {
        self.push(it.span, it.source.value.as_str(), Form::Declaration);
    }

    fn visit_export_named_declaration(&mut self, it: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &it.source {
            self.push(it.span, source.value.as_str(), Form::Declaration);
        }
        walk::walk_export_named_declaration(self, it);
    }

    fn visit_export_all_declaration(&mut self, it: &ExportAllDeclaration<'a>) {
        self.push(it.span, it.source.value.as_str(), Form::Declaration);
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        if let Some(specifier) = static_string(&it.source) {
            self.push(it.span, &specifier, Form::Dynamic);
        }
        walk::walk_import_expression(self, it);
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Some(specifier) = required_specifier(it) {
            self.push(it.span, &specifier, Form::Require);
        }
        walk::walk_call_expression(self, it);
    }
}

/// A string literal, or a template literal without substitutions
fn static_string(expr: &Expression<'_>) -> Option<String> {
    match expr {
        Expression::StringLiteral(lit) => Some(lit.value.to_string()),
        Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => tpl
            .quasis
            .first()
            .and_then(|quasi| quasi.value.cooked.as_ref())
            .map(|cooked| cooked.to_string()),
        _ => None,
    }
}

/// `require(<static string>)` with exactly one argument
fn required_specifier(call: &CallExpression<'_>) -> Option<String> {
    let Expression::Identifier(callee) = &call.callee else {
        return None;
    };
    if callee.name.as_str() != "require" || call.arguments.len() != 1 {
        return None;
    }
    static_string(call.arguments.first()?.as_expression()?)
}

/// Imports of a script in source order, each specifier/kind pair once
pub fn scan_js(source: &str, path: &Path) -> Result<Vec<JsImport>> {
    let allocator = Allocator::default();
    let program = parse_script(&allocator, source, path)?;

    let mut imports: Vec<JsImport> = Vec::new();
    for reference in ReferenceCollector::collect(&program) {
        let import = reference.import();
        if !imports.contains(&import) {
            imports.push(import);
        }
    }
    Ok(imports)
}

fn url_ref(caps: &Captures<'_>) -> Option<UrlRef> {
    let m = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    Some(UrlRef {
        range: m.range(),
        url: m.as_str().to_string(),
    })
}

/// `url(...)` references in a stylesheet
pub fn scan_css_urls(css: &str) -> Vec<UrlRef> {
    CSS_URL.captures_iter(css).filter_map(|c| url_ref(&c)).collect()
}

/// `src` attributes of media elements in HTML
pub fn scan_html_sources(html: &str) -> Vec<UrlRef> {
    HTML_SRC.captures_iter(html).filter_map(|c| url_ref(&c)).collect()
}
