//! Relative import resolution confined to the project root.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use oxc_resolver::{ResolveOptions, Resolver as OxcResolver};
use path_clean::PathClean;

use crate::{Error, Result};

#[derive(Clone)]
pub struct Resolver {
    root: PathBuf,
    inner: Arc<OxcResolver>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").field("root", &self.root).finish()
    }
}

impl Resolver {
    /// `extensions` are tried in order for extensionless specifiers, then as `index` files
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        let inner = OxcResolver::new(ResolveOptions {
            extensions,
            condition_names: vec!["import".into(), "module".into(), "default".into()],
            // Module ids are relative to the root; symlinked paths are kept as written.
            symlinks: false,
            ..ResolveOptions::default()
        });
        Self {
            root: root.into().clean(),
            inner: Arc::new(inner),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a module specifier written in `importer`.
    ///
    /// Only relative specifiers are bundled. A query or fragment is ignored.
    pub fn resolve(&self, specifier: &str, importer: &Path) -> Result<PathBuf> {
        let unresolved = || Error::UnresolvedImport {
            specifier: specifier.to_string(),
            importer: importer.to_path_buf(),
        };
        let outside = |path: PathBuf| Error::SecurityViolation {
            path,
            reason: format!("'{specifier}' points outside the project"),
        };

        let request = strip_query(specifier);
        if !is_relative(request) {
            return Err(unresolved());
        }

        let dir = importer.parent().unwrap_or(&self.root);
        let base = dir.join(request).clean();
        if !base.starts_with(&self.root) {
            return Err(outside(base));
        }

        let resolution = self.inner.resolve(dir, request).map_err(|err| {
            tracing::debug!(specifier, importer = %importer.display(), error = %err, "resolution failed");
            unresolved()
        })?;
        let resolved = resolution.path().clean();
        if !resolved.starts_with(&self.root) {
            return Err(outside(resolved));
        }
        Ok(resolved)
    }

    /// Resolve a `url()` or `src` reference, where bare paths are relative.
    pub fn resolve_url(&self, url: &str, importer: &Path) -> Result<PathBuf> {
        if is_relative(url) {
            self.resolve(url, importer)
        } else {
            self.resolve(&format!("./{url}"), importer)
        }
    }

    /// Stable module id: the path relative to the root, prefixed with `./`
    pub fn module_id(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<_> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect();
        format!("./{}", parts.join("/"))
    }
}

pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Whether a `url()`/`src` value refers to a local file that the build should process
pub fn is_local_url(url: &str) -> bool {
    let url = url.trim();
    !(url.is_empty()
        || url.starts_with('#')
        || url.starts_with('/')
        || url.starts_with("data:")
        || url.contains("://")
        || url.starts_with("mailto:")
        || url.contains("{{"))
}

fn strip_query(specifier: &str) -> &str {
    let end = specifier.find(['?', '#']).unwrap_or(specifier.len());
    &specifier[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> (TempDir, Resolver) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/js/util")).unwrap();
        fs::create_dir_all(dir.path().join("src/image")).unwrap();
        fs::write(dir.path().join("src/js/index.js"), "").unwrap();
        fs::write(dir.path().join("src/js/data.json"), "{}").unwrap();
        fs::write(dir.path().join("src/js/util/index.js"), "").unwrap();
        fs::write(dir.path().join("src/image/a.png"), "").unwrap();
        let resolver = Resolver::new(dir.path(), vec![".js".into(), ".json".into()]);
        (dir, resolver)
    }

    #[test]
    fn resolves_extensions_and_index() {
        let (dir, resolver) = project();
        let importer = dir.path().join("src/js/index.js");

        let data = resolver.resolve("./data", &importer).unwrap();
        assert!(data.ends_with("src/js/data.json"));

        let util = resolver.resolve("./util", &importer).unwrap();
        assert!(util.ends_with("src/js/util/index.js"));

        let image = resolver.resolve("../image/a.png?v=1", &importer).unwrap();
        assert_eq!(resolver.module_id(&image), "./src/image/a.png");
    }

    #[test]
    fn extensions_are_tried_in_order() {
        let (dir, resolver) = project();
        fs::write(dir.path().join("src/js/conf.js"), "").unwrap();
        fs::write(dir.path().join("src/js/conf.json"), "{}").unwrap();
        let importer = dir.path().join("src/js/index.js");

        let conf = resolver.resolve("./conf", &importer).unwrap();
        assert!(conf.ends_with("src/js/conf.js"));
        let json = resolver.resolve("./conf.json", &importer).unwrap();
        assert!(json.ends_with("src/js/conf.json"));
    }

    #[test]
    fn missing_files_are_unresolved() {
        let (dir, resolver) = project();
        let importer = dir.path().join("src/js/index.js");
        match resolver.resolve("./legacy", &importer).unwrap_err() {
            Error::UnresolvedImport { specifier, importer } => {
                assert_eq!(specifier, "./legacy");
                assert!(importer.ends_with("src/js/index.js"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bare_specifiers_are_unresolved() {
        let (dir, resolver) = project();
        let importer = dir.path().join("src/js/index.js");
        assert!(matches!(
            resolver.resolve("lodash", &importer).unwrap_err(),
            Error::UnresolvedImport { .. }
        ));
    }

    #[test]
    fn escaping_the_project_is_rejected() {
        let (dir, resolver) = project();
        let importer = dir.path().join("src/js/index.js");
        assert!(matches!(
            resolver.resolve("../../../outside.js", &importer).unwrap_err(),
            Error::SecurityViolation { .. }
        ));
    }

    #[test]
    fn urls_without_prefix_are_relative() {
        let (dir, resolver) = project();
        let importer = dir.path().join("src/index.scss");
        let image = resolver.resolve_url("image/a.png", &importer).unwrap();
        assert!(image.ends_with("src/image/a.png"));
    }

    #[test]
    fn local_url_detection() {
        assert!(is_local_url("../image/a.png"));
        assert!(is_local_url("image/a.png"));
        assert!(!is_local_url("data:image/png;base64,AAAA"));
        assert!(!is_local_url("https://example.com/a.png"));
        assert!(!is_local_url("//cdn.example.com/a.png"));
        assert!(!is_local_url("#icon"));
        assert!(!is_local_url("/static/a.png"));
    }
}
