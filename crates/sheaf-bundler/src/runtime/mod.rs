//! Bundle rendering: module factories wrapped in a small loader runtime.

pub mod esm;

use std::collections::HashMap;

use indexmap::IndexMap;
use sheaf_config::Mode;

use crate::chunk::{Chunk, ChunkKind};
use crate::graph::{Module, ModuleGraph};
use crate::Result;
use crate::loaders::{ModuleBody, js_string};
use esm::Links;

/// Name of the require function inside bundles
pub const REQUIRE: &str = "__sheaf_require__";

const BOOTSTRAP: &str = include_str!("bootstrap.js");

/// Everything a chunk needs to know about the rest of the build
pub struct RenderContext<'a> {
    pub graph: &'a ModuleGraph,
    pub chunks: &'a [Chunk],
    pub public_path: Option<&'a str>,
    pub mode: Mode,
}

impl RenderContext<'_> {
    /// Async chunk id by root module id
    fn async_roots(&self) -> HashMap<&str, &str> {
        self.chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Async)
            .map(|c| (c.root.as_str(), c.id.as_str()))
            .collect()
    }

    fn module_factory(
        &self,
        module: &Module,
        async_roots: &HashMap<&str, &str>,
    ) -> Result<String> {
        let code = match &module.body {
            ModuleBody::Generated(code) => code.clone(),
            ModuleBody::Script(source) => {
                let mut links = Links::default();
                for dep in &module.dependencies {
                    match async_roots.get(dep.target.as_str()).filter(|_| dep.is_dynamic()) {
                        Some(chunk) => links.link_async(&dep.specifier, &dep.target, chunk),
                        None => links.link(&dep.specifier, &dep.target),
                    }
                }
                esm::rewrite(source, &module.path, &links)?
            }
        };

        let comment = if self.mode.is_production() {
            String::new()
        } else {
            format!("// {}\n", module.id)
        };
        Ok(format!(
            "{}: function (module, exports, {REQUIRE}) {{\n{comment}{code}\n}}",
            js_string(&module.id)
        ))
    }

    fn module_table(&self, chunk: &Chunk) -> Result<String> {
        let async_roots = self.async_roots();
        let factories: Vec<String> = chunk
            .modules
            .iter()
            .filter_map(|id| self.graph.module(id))
            .map(|module| self.module_factory(module, &async_roots))
            .collect::<Result<_>>()?;
        Ok(if factories.is_empty() {
            "{}".to_string()
        } else {
            format!("{{\n{}\n}}", factories.join(",\n"))
        })
    }

    /// Runtime expression for the output root URL
    ///
    /// Without a configured public path the root is found relative to the
    /// script's own URL.
    fn public_path_expr(&self, js_file: &str) -> String {
        if let Some(public_path) = self.public_path {
            return js_string(public_path);
        }
        let depth = js_file.matches('/').count();
        let up = if depth == 0 {
            "./".to_string()
        } else {
            "../".repeat(depth)
        };
        format!(
            "document.currentScript ? new URL({}, document.currentScript.src).href : {}",
            js_string(&up),
            js_string(&up)
        )
    }

    fn chunk_files(&self) -> String {
        let files: IndexMap<&str, serde_json::Value> = self
            .chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Async)
            .filter_map(|c| {
                let js = c.js_file.as_deref()?;
                Some((c.id.as_str(), serde_json::json!({ "js": js, "css": c.css_file })))
            })
            .collect();
        serde_json::to_string(&files).unwrap_or_else(|_| "{}".to_string())
    }

    /// Script for an entry chunk, including the runtime
    pub fn render_entry(&self, chunk: &Chunk, js_file: &str) -> Result<String> {
        let modules = self.module_table(chunk)?;
        Ok(BOOTSTRAP
            .replace("__SHEAF_PUBLIC_PATH__", &self.public_path_expr(js_file))
            .replace("__SHEAF_CHUNKS__", &self.chunk_files())
            .replace("__SHEAF_ENTRY__", &js_string(&chunk.root))
            .replace("__SHEAF_MODULES__", &modules))
    }

    /// Script for an async chunk; it registers modules with an already loaded runtime
    pub fn render_async(&self, chunk: &Chunk) -> Result<String> {
        Ok(format!("self.__sheaf__.define({});\n", self.module_table(chunk)?))
    }
}
