//! The module graph: every file reachable from the entries, keyed by module id.

pub mod resolve;
pub mod scan;

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use sheaf_config::SheafConfig;

use crate::loaders::{ExtractedCss, ModuleBody, Pipeline};
use crate::{Error, Result};
use scan::ImportKind;

#[derive(Debug, Clone)]
pub struct Module {
    /// Path relative to the project root, `./`-prefixed
    pub id: String,
    pub path: PathBuf,
    pub body: ModuleBody,
    /// Stylesheet handed over by the `extract-css` loader
    pub css: Option<ExtractedCss>,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Specifier as written in the importer
    pub specifier: String,
    /// Module id of the resolved file
    pub target: String,
    pub kind: ImportKind,
}

impl Dependency {
    pub fn is_dynamic(&self) -> bool {
        self.kind == ImportKind::Dynamic
    }
}

#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: IndexMap<String, Module>,
    entries: IndexMap<String, String>,
}

impl ModuleGraph {
    /// Load every module reachable from the configured entries
    pub fn build(config: &SheafConfig, pipeline: &mut Pipeline) -> Result<Self> {
        let root = pipeline.resolver().root().to_path_buf();
        let mut graph = ModuleGraph::default();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();

        for (name, path) in &config.entry {
            let path = path_clean::clean(root.join(path));
            if !path.is_file() {
                return Err(Error::Config(sheaf_config::ConfigError::EntryNotFound {
                    name: name.clone(),
                    path,
                }));
            }
            let id = pipeline.resolver().module_id(&path);
            graph.entries.insert(name.clone(), id);
            queue.push_back(path);
        }

        while let Some(path) = queue.pop_front() {
            let id = pipeline.resolver().module_id(&path);
            if graph.modules.contains_key(&id) {
                continue;
            }

            let loaded = pipeline.load(&path)?;
            let mut dependencies = Vec::with_capacity(loaded.imports.len());
            for import in loaded.imports {
                let target = pipeline.resolver().resolve(&import.specifier, &path)?;
                dependencies.push(Dependency {
                    specifier: import.specifier,
                    target: pipeline.resolver().module_id(&target),
                    kind: import.kind,
                });
                queue.push_back(target);
            }

            tracing::debug!(module = %id, dependencies = dependencies.len(), "added module");
            graph.modules.insert(
                id.clone(),
                Module {
                    id,
                    path,
                    body: loaded.body,
                    css: loaded.css,
                    dependencies,
                },
            );
        }

        tracing::info!(
            modules = graph.modules.len(),
            entries = graph.entries.len(),
            "module graph built"
        );
        Ok(graph)
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn module_at(&self, path: &Path) -> Option<&Module> {
        self.modules.values().find(|m| m.path == path)
    }

    /// Entry name to root module id, in declaration order
    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules statically reachable from `root`, dependencies before importers
    pub fn static_closure(&self, root: &str) -> Vec<String> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        self.visit(root, &mut seen, &mut order);
        order
    }

    fn visit(&self, id: &str, seen: &mut HashSet<String>, order: &mut Vec<String>) {
        if !seen.insert(id.to_string()) {
            return;
        }
        let Some(module) = self.modules.get(id) else {
            return;
        };
        for dep in module.dependencies.iter().filter(|d| !d.is_dynamic()) {
            self.visit(&dep.target, seen, order);
        }
        order.push(id.to_string());
    }

    /// Targets of dynamic imports made by `modules`, in first-seen order
    pub fn dynamic_targets(&self, modules: &[String]) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for dep in modules
            .iter()
            .filter_map(|id| self.modules.get(id))
            .flat_map(|m| m.dependencies.iter())
            .filter(|d| d.is_dynamic())
        {
            if !targets.contains(&dep.target.as_str()) {
                targets.push(&dep.target);
            }
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn build(dir: &TempDir, manifest: &str) -> Result<ModuleGraph> {
        let config = SheafConfig::from_toml_str(manifest).unwrap();
        let mut pipeline = Pipeline::new(&config, dir.path())?;
        ModuleGraph::build(&config, &mut pipeline)
    }

    #[test]
    fn closure_lists_dependencies_first() {
        let dir = project(&[
            ("src/index.js", "import './a';\nimport './b';\n"),
            ("src/a.js", "import './shared';\n"),
            ("src/b.js", "import './shared';\nimport('./lazy');\n"),
            ("src/shared.js", ""),
            ("src/lazy.js", ""),
        ]);
        let graph = build(&dir, "[entry]\nindex = \"src/index.js\"").unwrap();

        assert_eq!(graph.len(), 5);
        let closure = graph.static_closure("./src/index.js");
        assert_eq!(
            closure,
            ["./src/shared.js", "./src/a.js", "./src/b.js", "./src/index.js"]
        );
        assert_eq!(graph.dynamic_targets(&closure), ["./src/lazy.js"]);
    }

    #[test]
    fn unresolved_import_names_the_importer() {
        let dir = project(&[("src/index.js", "import './missing';\n")]);
        let err = build(&dir, "[entry]\nindex = \"src/index.js\"").unwrap_err();
        match err {
            Error::UnresolvedImport { specifier, importer } => {
                assert_eq!(specifier, "./missing");
                assert!(importer.ends_with("src/index.js"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unmatched_files_fail() {
        let dir = project(&[
            ("src/index.js", "import './style.css';\n"),
            ("src/style.css", "a {}"),
        ]);
        let err = build(&dir, "[entry]\nindex = \"src/index.js\"").unwrap_err();
        assert!(matches!(err, Error::NoMatchingRule { .. }));
    }

    #[test]
    fn json_needs_no_rule() {
        let dir = project(&[
            ("src/index.js", "var data = require('./data.json');\n"),
            ("src/data.json", "{\"items\": [1, 2]}"),
        ]);
        let graph = build(&dir, "[entry]\nindex = \"src/index.js\"").unwrap();
        let data = graph.module("./src/data.json").unwrap();
        assert_eq!(
            data.body,
            ModuleBody::Generated("module.exports = {\"items\":[1,2]};".into())
        );
    }
}
