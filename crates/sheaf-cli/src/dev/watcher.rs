//! File system watcher for `sheaf dev`.
//!
//! Watches the project recursively and forwards relevant changes through a
//! channel. The output root, hidden paths and configured fragments are ignored.

use crate::error::{CliError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Paths the watcher never reports
#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    out_dir: PathBuf,
    patterns: Vec<String>,
}

impl WatchFilter {
    pub fn new(root: PathBuf, out_dir: PathBuf, patterns: Vec<String>) -> Self {
        Self {
            root,
            out_dir,
            patterns,
        }
    }

    pub fn should_ignore(&self, path: &Path) -> bool {
        if path.starts_with(&self.out_dir) {
            return true;
        }
        let Ok(rel_path) = path.strip_prefix(&self.root) else {
            return true;
        };

        let path_str = rel_path.to_string_lossy().replace('\\', "/");
        for pattern in &self.patterns {
            if let Some(ext) = pattern.strip_prefix('*') {
                if path_str.ends_with(ext) {
                    return true;
                }
            } else if path_str.starts_with(pattern.as_str())
                || path_str.contains(&format!("/{}", pattern))
            {
                return true;
            }
        }

        // Editor swap files and dot directories
        rel_path.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| name.starts_with('.') || name.ends_with('~'))
        })
    }
}

/// Recursive watcher with per-path debouncing.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `filter.root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root does not exist or cannot be watched.
    pub fn new(filter: WatchFilter, debounce_ms: u64) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        let root = filter.root.clone();
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(100);
        let debounce = Duration::from_millis(debounce_ms);
        let mut last_event: Option<(PathBuf, Instant)> = None;

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            for path in &event.paths {
                if filter.should_ignore(path) {
                    continue;
                }

                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if last_path == path && now.duration_since(*last_time) < debounce {
                        continue;
                    }
                }
                last_event = Some((path.clone(), now));

                let change = match event.kind {
                    EventKind::Create(_) => FileChange::Created(path.clone()),
                    EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };
                let _ = tx.blocking_send(change);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
