//! Chunk assembly: one chunk per entry plus one per dynamic import target.

use std::collections::{BTreeSet, HashSet};

use crate::graph::ModuleGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Entry,
    Async,
}

#[derive(Debug, Clone)]
pub struct Chunk {
    /// Entry name for entry chunks; for async chunks a sequential number
    /// that skips numbers taken by entry names
    pub id: String,
    pub name: Option<String>,
    pub kind: ChunkKind,
    /// Module id the chunk starts from
    pub root: String,
    /// Module ids in execution order
    pub modules: Vec<String>,
    /// Script file, known once the chunk is rendered
    pub js_file: Option<String>,
    /// Stylesheet file, set when the chunk has extracted CSS
    pub css_file: Option<String>,
}

impl Chunk {
    fn new(
        id: String,
        name: Option<String>,
        kind: ChunkKind,
        root: &str,
        modules: Vec<String>,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            root: root.to_string(),
            modules,
            js_file: None,
            css_file: None,
        }
    }

    pub fn is_entry(&self) -> bool {
        self.kind == ChunkKind::Entry
    }

    /// Name used for `[name]` in filename templates
    pub fn template_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Group the graph into chunks
///
/// Entry chunks hold their whole static closure. An async chunk leaves out
/// only modules already present in every entry chunk that can load it.
pub fn assemble(graph: &ModuleGraph) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = graph
        .entries()
        .iter()
        .map(|(name, root)| {
            Chunk::new(
                name.clone(),
                Some(name.clone()),
                ChunkKind::Entry,
                root,
                graph.static_closure(root),
            )
        })
        .collect();
    let entry_count = chunks.len();

    // Entries able to reach each chunk, through any chain of async chunks.
    let mut reached_by: Vec<BTreeSet<usize>> =
        (0..entry_count).map(|i| BTreeSet::from([i])).collect();
    let mut edges: Vec<(usize, usize)> = Vec::new();

    let mut next_id = 0usize;
    let mut async_id = || loop {
        let id = next_id.to_string();
        next_id += 1;
        if !graph.entries().contains_key(&id) {
            break id;
        }
    };

    let mut next = 0;
    while next < chunks.len() {
        for target in graph.dynamic_targets(&chunks[next].modules) {
            let child = match chunks
                .iter()
                .position(|c| c.kind == ChunkKind::Async && c.root == target)
            {
                Some(index) => index,
                None => {
                    chunks.push(Chunk::new(
                        async_id(),
                        None,
                        ChunkKind::Async,
                        target,
                        graph.static_closure(target),
                    ));
                    reached_by.push(BTreeSet::new());
                    chunks.len() - 1
                }
            };
            edges.push((next, child));
        }
        next += 1;
    }

    let mut changed = true;
    while changed {
        changed = false;
        for &(parent, child) in &edges {
            let inherited: Vec<usize> = reached_by[parent]
                .difference(&reached_by[child])
                .copied()
                .collect();
            if !inherited.is_empty() {
                reached_by[child].extend(inherited);
                changed = true;
            }
        }
    }

    for index in entry_count..chunks.len() {
        let mut shared: Option<HashSet<&str>> = None;
        for &entry in &reached_by[index] {
            let modules: HashSet<&str> =
                chunks[entry].modules.iter().map(String::as_str).collect();
            shared = Some(match shared {
                Some(previous) => previous.intersection(&modules).copied().collect(),
                None => modules,
            });
        }
        let shared: HashSet<String> = shared
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();
        chunks[index].modules.retain(|id| !shared.contains(id));
    }

    tracing::debug!(
        entries = entry_count,
        async_chunks = chunks.len() - entry_count,
        "chunks assembled"
    );
    chunks
}

#[cfg(test)]
mod tests {
    use std::fs;

    use sheaf_config::SheafConfig;
    use tempfile::TempDir;

    use super::*;
    use crate::loaders::Pipeline;

    fn graph(files: &[(&str, &str)], manifest: &str) -> (TempDir, ModuleGraph) {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let config = SheafConfig::from_toml_str(manifest).unwrap();
        let mut pipeline = Pipeline::new(&config, dir.path()).unwrap();
        let graph = ModuleGraph::build(&config, &mut pipeline).unwrap();
        (dir, graph)
    }

    #[test]
    fn one_chunk_per_entry() {
        let (_dir, graph) = graph(
            &[
                ("src/index.js", "import './shared';"),
                ("src/list.js", "import './shared';"),
                ("src/shared.js", ""),
            ],
            "[entry]\nindex = \"src/index.js\"\nlist = \"src/list.js\"",
        );
        let chunks = assemble(&graph);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "index");
        assert_eq!(chunks[0].modules, ["./src/shared.js", "./src/index.js"]);
        assert_eq!(chunks[1].id, "list");
        assert_eq!(chunks[1].modules, ["./src/shared.js", "./src/list.js"]);
    }

    #[test]
    fn async_chunks_skip_modules_every_loader_has() {
        let (_dir, graph) = graph(
            &[
                ("src/index.js", "import './shared';\nimport('./lazy');"),
                ("src/list.js", "import('./lazy');"),
                ("src/lazy.js", "import './shared';\nimport('./deeper');"),
                ("src/deeper.js", "import './shared';"),
                ("src/shared.js", ""),
            ],
            "[entry]\nindex = \"src/index.js\"\nlist = \"src/list.js\"",
        );
        let chunks = assemble(&graph);

        assert_eq!(chunks.len(), 4);
        let lazy = &chunks[2];
        assert_eq!((lazy.id.as_str(), lazy.kind), ("0", ChunkKind::Async));
        // `list` does not contain shared.js, so the async chunk must.
        assert_eq!(lazy.modules, ["./src/shared.js", "./src/lazy.js"]);
        assert_eq!(chunks[3].id, "1");
        assert_eq!(chunks[3].root, "./src/deeper.js");
    }

    #[test]
    fn async_ids_skip_numeric_entry_names() {
        let (_dir, graph) = graph(
            &[
                ("src/a.js", "import('./lazy');"),
                ("src/b.js", "import('./other');"),
                ("src/lazy.js", ""),
                ("src/other.js", ""),
            ],
            "[entry]\n\"0\" = \"src/a.js\"\n\"2\" = \"src/b.js\"",
        );
        let chunks = assemble(&graph);

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["0", "2", "1", "3"]);
        assert_eq!(chunks[2].root, "./src/lazy.js");
    }

    #[test]
    fn async_chunk_of_one_entry_reuses_its_modules() {
        let (_dir, graph) = graph(
            &[
                ("src/index.js", "import './shared';\nimport('./lazy');"),
                ("src/lazy.js", "import './shared';"),
                ("src/shared.js", ""),
            ],
            "[entry]\nindex = \"src/index.js\"",
        );
        let chunks = assemble(&graph);
        assert_eq!(chunks[1].modules, ["./src/lazy.js"]);
    }
}
