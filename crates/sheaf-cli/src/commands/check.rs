//! `sheaf check`: validate the manifest without building.

use sheaf_config::{ConfigValidator, FsValidator, SchemaValidator, lint};

use crate::cli::CheckArgs;
use crate::commands::utils;
use crate::error::{ConfigError, Result};
use crate::ui;

/// Execute the check command.
///
/// 1. Load the manifest
/// 2. Schema validation: entries declared, rules, plugins, templates
/// 3. Filesystem validation: entry modules and page templates exist
/// 4. Lint: duplicate page filenames, unused options
///
/// Lint findings fail the command only with `--warnings`.
pub async fn execute(args: CheckArgs) -> Result<()> {
    ui::info("Checking configuration...");

    let loaded = utils::load_config(&args.config)?;
    let config = &loaded.config;
    ui::info(&format!("Manifest: {}", loaded.manifest.display()));

    SchemaValidator.validate(config)?;
    ui::success("Schema is valid");

    let project_root = config.project_root(&loaded.manifest_dir);
    FsValidator::new(&project_root).validate(config)?;
    for (name, path) in &config.entry {
        ui::success(&format!("  entry {} -> {}", name, path.display()));
    }
    for page in config.html_pages() {
        ui::success(&format!(
            "  page {} <- {}",
            page.filename,
            page.template.display()
        ));
    }

    let warnings = lint(config);
    for warning in &warnings {
        ui::warning(&warning.to_string());
    }
    if args.warnings && !warnings.is_empty() {
        return Err(ConfigError::Warnings {
            count: warnings.len(),
        }
        .into());
    }

    ui::success("All checks passed!");
    Ok(())
}
