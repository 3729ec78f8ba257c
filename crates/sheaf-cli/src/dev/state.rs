//! Shared state for the development server.
//!
//! Build status, the in-memory output and connected clients, each behind a
//! `parking_lot` lock.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use sheaf_bundler::{OutputAssets, mime};
use tokio::sync::mpsc;

use crate::dev::DevEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    NotStarted,
    InProgress { started_at: Instant },
    Success { duration_ms: u64 },
    Failed { error: String },
}

impl BuildStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildStatus::InProgress { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success { .. })
    }

    /// Error message if the last build failed
    pub fn error(&self) -> Option<&str> {
        match self {
            BuildStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Output files by URL path, e.g. `/pages/index.html`
#[derive(Debug, Clone, Default)]
pub struct BundleCache {
    files: HashMap<String, (Vec<u8>, &'static str)>,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every asset of a build under `/` + its filename
    pub fn from_assets(assets: &OutputAssets) -> Self {
        let mut cache = Self::new();
        for (filename, asset) in assets.iter() {
            cache.insert(
                format!("/{filename}"),
                asset.content.clone(),
                mime::content_type(Path::new(filename)),
            );
        }
        cache
    }

    pub fn insert(&mut self, path: String, content: Vec<u8>, content_type: &'static str) {
        self.files.insert(path, (content, content_type));
    }

    pub fn get(&self, path: &str) -> Option<(&[u8], &'static str)> {
        self.files
            .get(path)
            .map(|(content, content_type)| (content.as_slice(), *content_type))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Connected SSE clients by id
pub type ClientRegistry = Arc<RwLock<HashMap<usize, mpsc::Sender<DevEvent>>>>;

pub struct DevServerState {
    status: RwLock<BuildStatus>,
    cache: RwLock<BundleCache>,
    clients: ClientRegistry,
    next_client_id: RwLock<usize>,
    out_dir: PathBuf,
    hot: bool,
}

impl DevServerState {
    pub fn new(out_dir: PathBuf, hot: bool) -> Self {
        Self {
            status: RwLock::new(BuildStatus::NotStarted),
            cache: RwLock::new(BundleCache::new()),
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_client_id: RwLock::new(0),
            out_dir,
            hot,
        }
    }

    pub fn status(&self) -> BuildStatus {
        self.status.read().clone()
    }

    pub fn start_build(&self) {
        *self.status.write() = BuildStatus::InProgress {
            started_at: Instant::now(),
        };
    }

    pub fn complete_build(&self, duration_ms: u64, cache: BundleCache) {
        *self.cache.write() = cache;
        *self.status.write() = BuildStatus::Success { duration_ms };
    }

    /// Record a failure; the previous output stays cached
    pub fn fail_build(&self, error: String) {
        *self.status.write() = BuildStatus::Failed { error };
    }

    /// Cached file content and content type
    pub fn cached_file(&self, path: &str) -> Option<(Vec<u8>, &'static str)> {
        self.cache
            .read()
            .get(path)
            .map(|(content, content_type)| (content.to_vec(), content_type))
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    /// Register an SSE client; returns its id and event receiver
    pub fn register_client(&self) -> (usize, mpsc::Receiver<DevEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let id = {
            let mut next = self.next_client_id.write();
            let id = *next;
            *next += 1;
            id
        };
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Send an event to every client, dropping the ones that disconnected
    pub async fn broadcast(&self, event: &DevEvent) {
        let clients = self.clients.read().clone();

        let mut failed_ids = Vec::new();
        for (id, tx) in clients {
            if tx.send(event.clone()).await.is_err() {
                failed_ids.push(id);
            }
        }

        for id in failed_ids {
            self.unregister_client(id);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Whether bundles carry the hot client themselves
    pub fn is_hot(&self) -> bool {
        self.hot
    }
}

/// Shared state handle.
pub type SharedState = Arc<DevServerState>;

#[cfg(test)]
mod tests {
    use super::*;
    use sheaf_bundler::AssetKind;

    #[test]
    fn build_status_lifecycle() {
        let state = DevServerState::new(PathBuf::from("dist"), false);
        assert_eq!(state.status(), BuildStatus::NotStarted);

        state.start_build();
        assert!(state.status().is_in_progress());

        state.complete_build(150, BundleCache::new());
        assert!(state.status().is_success());

        state.fail_build("Test error".to_string());
        assert_eq!(state.status().error(), Some("Test error"));
    }

    #[test]
    fn cache_is_keyed_by_url_path() {
        let mut assets = OutputAssets::new();
        assets.emit("js/index.js", AssetKind::Script, b"1".to_vec());
        assets.emit("pages/index.html", AssetKind::Page, b"<html></html>".to_vec());

        let cache = BundleCache::from_assets(&assets);
        assert_eq!(cache.len(), 2);
        let (content, content_type) = cache.get("/js/index.js").unwrap();
        assert_eq!(content, b"1");
        assert_eq!(content_type, "application/javascript");
        assert_eq!(cache.get("/pages/index.html").unwrap().1, "text/html");
    }

    #[test]
    fn failed_build_keeps_previous_output() {
        let state = DevServerState::new(PathBuf::from("dist"), false);
        let mut cache = BundleCache::new();
        cache.insert("/js/index.js".to_string(), b"ok".to_vec(), "application/javascript");
        state.complete_build(10, cache);

        state.fail_build("syntax error".to_string());
        assert_eq!(state.cached_file("/js/index.js").unwrap().0, b"ok");
    }

    #[tokio::test]
    async fn broadcast_drops_disconnected_clients() {
        let state = DevServerState::new(PathBuf::from("dist"), false);
        let (_first, mut rx) = state.register_client();
        let (_second, dropped) = state.register_client();
        drop(dropped);
        assert_eq!(state.client_count(), 2);

        state.broadcast(&DevEvent::Reload).await;

        assert_eq!(rx.recv().await, Some(DevEvent::Reload));
        assert_eq!(state.client_count(), 1);
    }
}
