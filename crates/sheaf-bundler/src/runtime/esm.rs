//! Rewrites module syntax into calls on the bundle runtime.
//!
//! The script is parsed with oxc and edited by span: import declarations
//! become `__sheaf_require__` calls bound to `var`s, `require()` and
//! `import()` calls are pointed at module ids, and exports become getters
//! registered on `exports`. Bindings are copied at import time rather than
//! live.

use std::collections::HashMap;
use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Declaration, ExportAllDeclaration, ExportDefaultDeclaration, ExportDefaultDeclarationKind,
    ExportNamedDeclaration, ImportDeclaration, ImportDeclarationSpecifier, ModuleDeclaration,
    ModuleExportName,
};
use oxc_span::{GetSpan, Span};

use super::REQUIRE;
use crate::Result;
use crate::graph::scan::{Form, ReferenceCollector, parse_script};
use crate::loaders::js_string;

/// Where each specifier of a module points after graph building
#[derive(Debug, Clone, Default)]
pub struct Links {
    modules: HashMap<String, String>,
    chunks: HashMap<String, String>,
}

impl Links {
    pub fn link(&mut self, specifier: &str, module_id: &str) {
        self.modules
            .insert(specifier.to_string(), module_id.to_string());
    }

    pub fn link_async(&mut self, specifier: &str, module_id: &str, chunk_id: &str) {
        self.link(specifier, module_id);
        self.chunks
            .insert(specifier.to_string(), chunk_id.to_string());
    }

    fn require(&self, specifier: &str) -> Option<String> {
        self.modules
            .get(specifier)
            .map(|id| format!("{REQUIRE}({})", js_string(id)))
    }
}

/// Replace `start..end` of the source with `text`
#[derive(Debug)]
struct Edit {
    start: u32,
    end: u32,
    text: String,
}

struct Rewriter<'l> {
    links: &'l Links,
    edits: Vec<Edit>,
    getters: Vec<(String, String)>,
    temps: usize,
    is_module: bool,
}

impl Rewriter<'_> {
    fn temp(&mut self) -> String {
        let name = format!("__sheaf_m{}__", self.temps);
        self.temps += 1;
        name
    }

    fn replace(&mut self, span: Span, text: String) {
        self.replace_range(span.start, span.end, text);
    }

    fn replace_range(&mut self, start: u32, end: u32, text: String) {
        self.edits.push(Edit { start, end, text });
    }

    fn export(&mut self, exported: &str, expr: String) {
        self.is_module = true;
        self.getters.retain(|(name, _)| name != exported);
        self.getters.push((exported.to_string(), expr));
    }

    fn module_declaration(&mut self, declaration: &ModuleDeclaration<'_>) {
        match declaration {
            ModuleDeclaration::ImportDeclaration(import) => self.import(import),
            ModuleDeclaration::ExportNamedDeclaration(export) => self.export_named(export),
            ModuleDeclaration::ExportAllDeclaration(export) => self.export_all(export),
            ModuleDeclaration::ExportDefaultDeclaration(export) => self.export_default(export),
            _ => {}
        }
    }

    fn import(&mut self, import: &ImportDeclaration<'_>) {
        let Some(require) = self.links.require(import.source.value.as_str()) else {
            return;
        };
        self.is_module = true;

        let Some(specifiers) = import.specifiers.as_ref().filter(|s| !s.is_empty()) else {
            self.replace(import.span, format!("{require};"));
            return;
        };

        let tmp = self.temp();
        let mut out = vec![format!("var {tmp} = {require};")];
        for specifier in specifiers {
            match specifier {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(spec) => {
                    out.push(format!("var {} = {};", spec.local.name, default_of(&tmp)));
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns) => {
                    out.push(format!("var {} = {tmp};", ns.local.name));
                }
                ImportDeclarationSpecifier::ImportSpecifier(named) => {
                    let imported = export_name(&named.imported);
                    out.push(format!("var {} = {};", named.local.name, member(&tmp, &imported)));
                }
            }
        }
        self.replace(import.span, out.join(" "));
    }

    fn export_named(&mut self, export: &ExportNamedDeclaration<'_>) {
        if let Some(source) = &export.source {
            let Some(require) = self.links.require(source.value.as_str()) else {
                return;
            };
            let tmp = self.temp();
            for specifier in &export.specifiers {
                let local = export_name(&specifier.local);
                self.export(&export_name(&specifier.exported), member(&tmp, &local));
            }
            self.is_module = true;
            self.replace(export.span, format!("var {tmp} = {require};"));
            return;
        }

        if let Some(declaration) = &export.declaration {
            for name in declared_names(declaration) {
                self.export(&name, name.clone());
            }
            self.replace_range(export.span.start, declaration.span().start, String::new());
            return;
        }

        for specifier in &export.specifiers {
            let local = export_name(&specifier.local);
            self.export(&export_name(&specifier.exported), local);
        }
        self.is_module = true;
        self.replace(export.span, String::new());
    }

    fn export_all(&mut self, export: &ExportAllDeclaration<'_>) {
        let Some(require) = self.links.require(export.source.value.as_str()) else {
            return;
        };
        self.is_module = true;
        match &export.exported {
            Some(ns) => {
                let tmp = self.temp();
                self.export(&export_name(ns), tmp.clone());
                self.replace(export.span, format!("var {tmp} = {require};"));
            }
            None => {
                self.replace(export.span, format!("{REQUIRE}.r(exports, {require});"));
            }
        }
    }

    fn export_default(&mut self, export: &ExportDefaultDeclaration<'_>) {
        self.is_module = true;
        let body = export.declaration.span();
        let (named, is_declaration) = match &export.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                (func.id.as_ref().map(|id| id.name.to_string()), true)
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                (class.id.as_ref().map(|id| id.name.to_string()), true)
            }
            _ => (None, false),
        };

        match named {
            Some(name) => {
                self.export("default", name);
                self.replace_range(export.span.start, body.start, String::new());
            }
            None => {
                self.replace_range(export.span.start, body.start, "exports.default = ".to_string());
                // An anonymous declaration turned expression needs its own terminator.
                if is_declaration {
                    self.replace_range(export.span.end, export.span.end, ";".to_string());
                }
            }
        }
    }

    fn dynamic_import(&self, specifier: &str) -> Option<String> {
        let require = self.links.require(specifier)?;
        Some(match self.links.chunks.get(specifier) {
            Some(chunk) => format!(
                "{REQUIRE}.e({}).then(function () {{ return {REQUIRE}.i({require}); }})",
                js_string(chunk)
            ),
            None => format!("Promise.resolve().then(function () {{ return {REQUIRE}.i({require}); }})"),
        })
    }
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

/// Every binding a declaration introduces, destructured ones included
fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    match declaration {
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .flat_map(|declarator| declarator.id.get_binding_identifiers())
            .map(|ident| ident.name.to_string())
            .collect(),
        Declaration::FunctionDeclaration(func) => {
            func.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::ClassDeclaration(class) => {
            class.id.iter().map(|id| id.name.to_string()).collect()
        }
        _ => Vec::new(),
    }
}

fn default_of(tmp: &str) -> String {
    format!("{REQUIRE}.i({tmp}).default")
}

/// Property access on a module namespace
fn member(object: &str, name: &str) -> String {
    if name == "default" {
        return default_of(object);
    }
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        format!("{object}.{name}")
    } else {
        format!("{object}[{}]", js_string(name))
    }
}

fn apply(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| (edit.start, edit.end));
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        let (start, end) = (edit.start as usize, edit.end as usize);
        if start < cursor {
            tracing::debug!(start, end, "skipping overlapping edit");
            continue;
        }
        out.push_str(&source[cursor..start]);
        out.push_str(&edit.text);
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Rewrite a script so it runs inside a module factory
pub fn rewrite(source: &str, path: &Path, links: &Links) -> Result<String> {
    let allocator = Allocator::default();
    let program = parse_script(&allocator, source, path)?;

    let mut rw = Rewriter {
        links,
        edits: Vec::new(),
        getters: Vec::new(),
        temps: 0,
        is_module: false,
    };

    for statement in &program.body {
        if let Some(declaration) = statement.as_module_declaration() {
            rw.module_declaration(declaration);
        }
    }

    for reference in ReferenceCollector::collect(&program) {
        let replacement = match reference.form {
            Form::Declaration => continue,
            Form::Require => links.require(&reference.specifier),
            Form::Dynamic => rw.dynamic_import(&reference.specifier),
        };
        if let Some(text) = replacement {
            rw.replace(reference.span, text);
        }
    }

    let code = apply(source, rw.edits);
    if !rw.is_module {
        return Ok(code);
    }

    let getters = rw
        .getters
        .iter()
        .map(|(name, expr)| format!("{}: function () {{ return {expr}; }}", js_string(name)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("{REQUIRE}.x(exports, {{{getters}}});\n{code}"))
}
