//! Builds for the development server.
//!
//! Every build is written to the output root, like `sheaf build`, and kept
//! in memory for serving. The previous output decides whether a rebuild can
//! swap stylesheets or must reload the page.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use sheaf_bundler::{Bundler, OutputAssets};

use crate::commands::build::build_and_write;
use crate::dev::{BundleCache, DevEvent};
use crate::error::Result;

/// A finished dev build
#[derive(Debug)]
pub struct DevBuild {
    pub duration_ms: u64,
    pub cache: BundleCache,
    /// Event for connected pages
    pub event: DevEvent,
    pub warnings: Vec<String>,
}

pub struct DevBuilder {
    bundler: Arc<Bundler>,
    hot: bool,
    previous: Mutex<Option<OutputAssets>>,
}

impl DevBuilder {
    pub fn new(bundler: Bundler, hot: bool) -> Self {
        Self {
            bundler: Arc::new(bundler),
            hot,
            previous: Mutex::new(None),
        }
    }

    /// Build, write and index the output.
    ///
    /// On failure the previous output is kept for the next comparison.
    pub async fn build(&self) -> Result<DevBuild> {
        let start = Instant::now();
        let output = build_and_write(Arc::clone(&self.bundler)).await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let mut previous = self.previous.lock();
        let styles_only = previous
            .as_ref()
            .is_some_and(|assets| output.only_styles_changed(assets));
        let event = reload_event(self.hot, styles_only);
        let cache = BundleCache::from_assets(&output.assets);
        *previous = Some(output.assets);

        tracing::debug!(duration_ms, event = event.name(), "dev build finished");
        Ok(DevBuild {
            duration_ms,
            cache,
            event,
            warnings: output.warnings,
        })
    }
}

/// Stylesheet swaps need the hot client; without it every change reloads
fn reload_event(hot: bool, styles_only: bool) -> DevEvent {
    if hot && styles_only {
        DevEvent::Css
    } else {
        DevEvent::Reload
    }
}
