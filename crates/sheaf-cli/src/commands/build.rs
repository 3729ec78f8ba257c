//! `sheaf build`: build once and write the output root.

use std::sync::Arc;
use std::time::Instant;

use sheaf_bundler::{BuildOutput, Bundler};

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::error::{BuildError, Result};
use crate::ui;

/// Execute the build command.
///
/// 1. Load the manifest (file, profile, environment, flags)
/// 2. Validate the output root
/// 3. Build in memory on the blocking pool
/// 4. Write, resetting the output root first when the clean plugin is set
/// 5. Print a summary
pub async fn execute(args: BuildArgs) -> Result<()> {
    let started = Instant::now();

    ui::info("Loading configuration...");
    let loaded = utils::load_config(&args.config)?;
    let mut config = loaded.config;
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(out_dir) = args.out_dir {
        config.output.path = out_dir;
    }

    let bundler = Bundler::new(config, loaded.manifest_dir);
    let project_root = bundler.project_root()?;
    let out_dir = bundler.config().output_dir(&project_root);
    utils::validate_output_dir(&out_dir, &project_root)?;

    let config = bundler.config();
    ui::info(&format!(
        "Building {} {} in {} mode",
        config.entry.len(),
        if config.entry.len() == 1 { "entry" } else { "entries" },
        config.mode
    ));
    for (name, path) in &config.entry {
        ui::info(&format!("  - {}: {}", name, path.display()));
    }

    let output = build_and_write(Arc::new(bundler)).await?;
    for warning in &output.warnings {
        ui::warning(warning);
    }

    let files: Vec<(String, u64)> = output
        .assets
        .iter()
        .map(|(name, asset)| (name.to_string(), asset.size() as u64))
        .collect();
    ui::print_build_summary(&files, started.elapsed());
    ui::success(&format!(
        "Built to {} in {}",
        output.out_dir.display(),
        ui::format_duration(started.elapsed())
    ));

    Ok(())
}

/// Build and write on the blocking pool.
///
/// Nothing is written when the build fails, so the previous output survives.
pub async fn build_and_write(bundler: Arc<Bundler>) -> Result<BuildOutput> {
    tokio::task::spawn_blocking(move || -> Result<BuildOutput> {
        let output = bundler.build()?;
        let written = output.write()?;
        tracing::debug!(files = written.len(), "wrote build output");
        Ok(output)
    })
    .await
    .map_err(|e| BuildError::Task(e.to_string()))?
}
