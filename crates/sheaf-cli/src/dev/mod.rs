//! Development server.
//!
//! - builds on the blocking pool and serves results from memory
//! - falls back to the output root on disk
//! - pushes reload events to pages over Server-Sent Events
//! - watches the project and rebuilds with debouncing

pub mod builder;
pub mod config;
pub mod error_page;
pub mod server;
pub mod state;
pub mod watcher;

pub use builder::{DevBuild, DevBuilder};
pub use config::DevConfig;
pub use server::DevServer;
pub use state::{BuildStatus, BundleCache, DevServerState, SharedState};
pub use watcher::{FileChange, FileWatcher};

use serde::Serialize;

/// Server-sent events endpoint
pub const EVENTS_PATH: &str = "/__sheaf/events";

/// Live reload client injected into pages when hot mode is off
pub const CLIENT_PATH: &str = "/__sheaf/client.js";

/// Events pushed to connected pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DevEvent {
    /// Only stylesheets changed; swap them in place
    Css,
    /// Anything else changed; reload the page
    Reload,
    /// The rebuild failed; the previous output is still served
    BuildFailed { error: String },
}

impl DevEvent {
    /// SSE event name the clients listen for
    pub fn name(&self) -> &'static str {
        match self {
            DevEvent::Css => "css",
            DevEvent::Reload => "reload",
            DevEvent::BuildFailed { .. } => "build-failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_payloads() {
        assert_eq!(serde_json::to_string(&DevEvent::Css).unwrap(), r#"{"type":"css"}"#);
        let failed = DevEvent::BuildFailed {
            error: "boom".to_string(),
        };
        assert_eq!(failed.name(), "build-failed");
        assert_eq!(
            serde_json::to_string(&failed).unwrap(),
            r#"{"type":"build-failed","error":"boom"}"#
        );
    }
}
