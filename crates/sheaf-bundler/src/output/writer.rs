//! Secure file writing for build output.
//!
//! All target paths are validated against the output root before anything is
//! written. Files are written to temporary siblings first and renamed once
//! every write succeeded; on failure the temporaries are removed.

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::output::OutputAssets;
use crate::{Error, Result};

/// System locations that are never cleaned, nor anything below them.
const PROTECTED_PREFIXES: &[&str] = &["/bin", "/boot", "/dev", "/etc", "/proc", "/sbin", "/sys"];

/// Locations that are never cleaned themselves.
const PROTECTED_DIRS: &[&str] = &["/", "/home", "/root", "/usr", "/var", "/tmp", "/lib", "/opt"];

/// Writes every asset under `dir`.
///
/// Either all files are written or none are: a failed write removes the
/// temporary files written so far.
pub fn write_assets(assets: &OutputAssets, dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = normalize_dir(dir)?;

    fs::create_dir_all(&dir).map_err(|e| {
        Error::WriteFailure(format!(
            "Failed to create output directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let mut operations = Vec::with_capacity(assets.len());
    for (filename, asset) in assets.iter() {
        let target_path = validate_output_path(&dir, filename)?;
        operations.push((target_path, asset.content.as_slice()));
    }

    write_files_atomic(&operations)?;
    Ok(operations.into_iter().map(|(path, _)| path).collect())
}

/// Removes the contents of `dir`, keeping the directory and the `keep` paths.
///
/// Refuses filesystem roots, system directories and any directory that
/// contains the project itself.
pub fn clean_output_dir(dir: &Path, project_root: &Path, keep: &[PathBuf]) -> Result<usize> {
    let dir = normalize_dir(dir)?;
    let project_root = normalize_dir(project_root)?;
    ensure_cleanable(&dir, &project_root)?;

    if !dir.exists() {
        return Ok(0);
    }
    if !dir.is_dir() {
        return Err(Error::UnsafeClean {
            path: dir,
            reason: "output path exists but is not a directory".to_string(),
        });
    }

    let keep: Vec<PathBuf> = keep.iter().map(|k| dir.join(k).clean()).collect();
    let mut removed = 0;
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if keep.iter().any(|k| k == &path) {
            continue;
        }
        if keep.iter().any(|k| k.starts_with(&path)) {
            removed += clean_except(&path, &keep)?;
            continue;
        }
        remove_path(&path)?;
        removed += 1;
    }

    tracing::debug!(dir = %dir.display(), removed, "cleaned output directory");
    Ok(removed)
}

fn clean_except(dir: &Path, keep: &[PathBuf]) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if keep.iter().any(|k| k == &path) {
            continue;
        }
        if path.is_dir() && keep.iter().any(|k| k.starts_with(&path)) {
            removed += clean_except(&path, keep)?;
            continue;
        }
        remove_path(&path)?;
        removed += 1;
    }
    Ok(removed)
}

fn remove_path(path: &Path) -> Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| Error::IoError {
        message: format!("Failed to remove '{}'", path.display()),
        source: e,
    })
}

fn ensure_cleanable(dir: &Path, project_root: &Path) -> Result<()> {
    let refuse = |reason: &str| {
        Err(Error::UnsafeClean {
            path: dir.to_path_buf(),
            reason: reason.to_string(),
        })
    };

    if PROTECTED_DIRS.iter().any(|p| dir == Path::new(p))
        || PROTECTED_PREFIXES.iter().any(|p| dir.starts_with(p))
    {
        return refuse("system directory");
    }
    if dir.parent().is_none() {
        return refuse("filesystem root");
    }
    if project_root.starts_with(dir) {
        return refuse("the output directory contains the project");
    }
    Ok(())
}

fn normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();
    if cleaned.is_absolute() {
        return Ok(cleaned);
    }
    let cwd = std::env::current_dir().map_err(|e| {
        Error::InvalidOutputPath(format!("Failed to get current directory: {}", e))
    })?;
    Ok(cwd.join(cleaned).clean())
}

/// Validates an output path to prevent directory traversal.
///
/// The filename is cleaned, joined to the base directory and cleaned again;
/// the result must still lie under the base directory.
pub(crate) fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }

    let filename_path = Path::new(filename).clean();
    let full_path = base_dir.join(&filename_path).clean();

    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

/// Two-phase write: temporaries first, then renames.
fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut temp_files = Vec::new();

    for (target_path, content) in operations {
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup_temp_files(&temp_files);
                Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = temp_path_for(target_path);
        fs::write(&temp_path, content).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to write temporary file '{}': {}",
                temp_path.display(),
                e
            ))
        })?;

        temp_files.push((temp_path, target_path.clone()));
    }

    for (temp_path, target_path) in &temp_files {
        fs::rename(temp_path, target_path).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                temp_path.display(),
                target_path.display(),
                e
            ))
        })?;
    }

    Ok(())
}

fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".sheaf-tmp");
    target.with_file_name(name)
}

/// Best-effort cleanup; we are already in an error state.
fn cleanup_temp_files(temp_files: &[(PathBuf, PathBuf)]) {
    for (temp_path, _) in temp_files {
        if temp_path.exists() {
            if let Err(e) = fs::remove_file(temp_path) {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %e,
                    "failed to clean up temporary file"
                );
            }
        }
    }
}
