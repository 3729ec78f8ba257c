//! Shared utilities for command implementations.
//!
//! - working directory resolution
//! - manifest discovery and layered loading
//! - output directory validation

use std::path::{Component, Path, PathBuf};

use figment::Figment;
use figment::providers::Env;
use serde_json::Value;
use sheaf_config::{ConfigDiscovery, SheafConfig};

use crate::cli::ConfigArgs;
use crate::error::{BuildError, CliError, ConfigError, Result};

/// Prefix of environment variables layered over the manifest
pub const ENV_PREFIX: &str = "SHEAF_";

/// A manifest loaded with profile, environment and flags applied
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SheafConfig,
    /// The manifest file that was read
    pub manifest: PathBuf,
    /// Directory of the manifest; the project context is relative to it
    pub manifest_dir: PathBuf,
}

/// Resolve a path relative to a working directory.
pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// The working directory: `--cwd` when given, else the process directory.
pub fn get_cwd(explicit: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    let Some(explicit) = explicit else {
        return Ok(current);
    };

    let absolute = resolve_path(explicit, &current);
    if !absolute.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "--cwd is not a directory: {}",
            absolute.display()
        )));
    }
    Ok(absolute)
}

/// The manifest to load: `--config`, else `sheaf.toml`, else `package.json`.
pub fn find_manifest(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    match explicit {
        Some(path) => {
            let path = resolve_path(path, cwd);
            if !path.is_file() {
                return Err(CliError::FileNotFound(path));
            }
            Ok(path)
        }
        None => ConfigDiscovery::new(cwd)
            .find()
            .ok_or_else(|| ConfigError::NotFound(cwd.to_path_buf()).into()),
    }
}

/// Load the manifest in layers.
///
/// Priority, lowest first: defaults, manifest file, `--profile`, `SHEAF_*`
/// environment variables. Command flags are applied by the caller on the
/// returned value.
pub fn load_config(args: &ConfigArgs) -> Result<LoadedConfig> {
    let cwd = get_cwd(args.cwd.as_deref())?;
    let manifest = find_manifest(args.config.as_deref(), &cwd)?;
    let manifest_dir = manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.clone());

    let raw = sheaf_config::load_value(&manifest)?;
    let profiled = SheafConfig::from_value(raw)?.materialize_profile(args.profile.as_deref())?;

    let mut value = profiled.to_value()?;
    overlay(&mut value, env_overrides(Figment::from(Env::prefixed(ENV_PREFIX).split("__")))?);
    let config = SheafConfig::from_value(value)?;

    tracing::debug!(
        manifest = %manifest.display(),
        profile = args.profile.as_deref().unwrap_or("-"),
        mode = %config.mode,
        "loaded configuration"
    );

    Ok(LoadedConfig {
        config,
        manifest,
        manifest_dir,
    })
}

/// Extract an environment overlay as a JSON tree.
///
/// Entry order lives in the manifest value, so the overlay is merged into it
/// rather than the other way round.
fn env_overrides(figment: Figment) -> Result<Value> {
    figment
        .extract::<Value>()
        .map_err(|e| ConfigError::Load(e.to_string()).into())
}

fn overlay(target: &mut Value, update: Value) {
    match (target, update) {
        (Value::Object(target), Value::Object(update)) => {
            for (key, value) in update {
                overlay(target.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, update) => *slot = update,
    }
}

/// Refuse output roots outside the project or inside system directories.
///
/// The output may sit inside the project or next to it.
pub fn validate_output_dir(out_dir: &Path, project_root: &Path) -> Result<()> {
    let canonical_out = canonicalize_lenient(out_dir)?;
    let canonical_root = project_root.canonicalize()?;

    let is_within_project = canonical_out.starts_with(&canonical_root);
    let is_sibling = canonical_out
        .parent()
        .zip(canonical_root.parent())
        .is_some_and(|(out_parent, root_parent)| out_parent == root_parent);

    if !is_within_project && !is_sibling {
        return Err(BuildError::OutputNotWritable(out_dir.to_path_buf()).into());
    }

    const DANGEROUS_PATHS: &[&str] = &[
        "/bin", "/boot", "/dev", "/etc", "/lib", "/lib64", "/proc", "/sbin", "/sys", "/usr/bin",
        "/usr/lib", "/usr/sbin", "/var/log",
    ];
    if canonical_out.parent().is_none()
        || DANGEROUS_PATHS.iter().any(|p| canonical_out.starts_with(p))
    {
        return Err(BuildError::OutputNotWritable(canonical_out).into());
    }

    Ok(())
}

/// Canonicalize the longest existing prefix and append the rest lexically.
fn canonicalize_lenient(path: &Path) -> Result<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                rest.push(name.to_os_string());
                existing = parent.to_path_buf();
            }
            _ => break,
        }
    }

    let mut resolved = existing.canonicalize()?;
    for name in rest.into_iter().rev() {
        match Path::new(&name).components().next() {
            Some(Component::ParentDir) => {
                resolved.pop();
            }
            Some(Component::CurDir) | None => {}
            _ => resolved.push(name),
        }
    }
    Ok(resolved)
}
