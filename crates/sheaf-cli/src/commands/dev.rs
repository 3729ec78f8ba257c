//! `sheaf dev`: build, serve, watch and rebuild.
//!
//! 1. Load the manifest and build once
//! 2. Serve the output with live reload over SSE
//! 3. Watch the project; rebuild after a quiet period
//! 4. Stop on Ctrl+C

use std::sync::Arc;
use std::time::Duration;

use sheaf_bundler::{Bundler, DevSession};
use tokio::signal;
use tokio::sync::mpsc;

use crate::cli::DevArgs;
use crate::commands::utils;
use crate::dev::watcher::WatchFilter;
use crate::dev::{
    DevBuilder, DevConfig, DevEvent, DevServer, DevServerState, EVENTS_PATH, FileChange,
    FileWatcher, SharedState,
};
use crate::error::Result;
use crate::ui;

/// Execute the dev command.
///
/// The initial build must succeed; later failures keep the previous output
/// served and are reported to connected pages.
pub async fn execute(args: DevArgs) -> Result<()> {
    ui::info("Starting development server...");

    let loaded = utils::load_config(&args.config)?;
    let mut bundler = Bundler::new(loaded.config, loaded.manifest_dir);
    let project_root = bundler.project_root()?;
    let config = DevConfig::new(bundler.config(), &args, project_root, loaded.manifest)?;
    utils::validate_output_dir(&config.out_dir, &config.project_root)?;

    if config.hot {
        bundler = bundler.with_dev_session(DevSession {
            events_url: EVENTS_PATH.to_string(),
        });
        ui::info("Hot mode: stylesheets are swapped in place");
    }

    let state: SharedState = Arc::new(DevServerState::new(config.out_dir.clone(), config.hot));
    let builder = DevBuilder::new(bundler, config.hot);

    ui::info("Performing initial build...");
    state.start_build();
    match builder.build().await {
        Ok(build) => {
            for warning in &build.warnings {
                ui::warning(warning);
            }
            ui::success(&format!(
                "Initial build completed in {}",
                ui::format_duration(Duration::from_millis(build.duration_ms))
            ));
            state.complete_build(build.duration_ms, build.cache);
            ui::info(&format!("Serving {} files from memory", state.cached_len()));
        }
        Err(e) => {
            state.fail_build(e.to_string());
            ui::error("Initial build failed");
            return Err(e);
        }
    }

    let filter = WatchFilter::new(
        config.project_root.clone(),
        config.out_dir.clone(),
        config.watch_ignore.clone(),
    );
    let (watcher, mut change_rx) = FileWatcher::new(filter, config.debounce_ms)?;
    ui::info(&format!("Watching {}", watcher.root().display()));

    let server = DevServer::new(config.clone(), Arc::clone(&state));
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = server.start().await {
            ui::error(&e.to_string());
        }
    });

    ui::info("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(change) = change_rx.recv() => {
                let changes = settle(change, &mut change_rx, config.debounce_ms).await;
                if changes.iter().any(|c| c.path() == config.manifest) {
                    ui::warning("The manifest changed; restart `sheaf dev` to apply it");
                }
                rebuild(&changes, &builder, &state).await;
            }

            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                break;
            }

            _ = &mut server_handle => {
                ui::warning("Server task completed unexpectedly");
                break;
            }
        }
    }

    server_handle.abort();
    ui::success("Development server stopped");
    Ok(())
}

/// Collect changes until the watcher has been quiet for the debounce period.
async fn settle(
    first: FileChange,
    rx: &mut mpsc::Receiver<FileChange>,
    debounce_ms: u64,
) -> Vec<FileChange> {
    let mut changes = vec![first];
    let quiet = Duration::from_millis(debounce_ms);
    while let Ok(Some(change)) = tokio::time::timeout(quiet, rx.recv()).await {
        if !changes.contains(&change) {
            changes.push(change);
        }
    }
    changes
}

async fn rebuild(changes: &[FileChange], builder: &DevBuilder, state: &SharedState) {
    match changes {
        [change] => ui::info(&format!("File changed: {}", change.path().display())),
        _ => ui::info(&format!("{} files changed", changes.len())),
    }

    state.start_build();
    match builder.build().await {
        Ok(build) => {
            ui::success(&format!(
                "Rebuild completed in {}",
                ui::format_duration(Duration::from_millis(build.duration_ms))
            ));
            let event = build.event.clone();
            state.complete_build(build.duration_ms, build.cache);
            state.broadcast(&event).await;
        }
        Err(e) => {
            let error = e.to_string();
            ui::error(&format!("Rebuild failed: {}", error));
            state.fail_build(error.clone());
            state.broadcast(&DevEvent::BuildFailed { error }).await;
        }
    }
}
