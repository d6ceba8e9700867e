//! Filesystem utilities for aarstage.

use std::path::{Path, PathBuf};

use crate::error::UtilError;

/// Create a directory and all parent directories if they do not exist.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<(), UtilError> {
    std::fs::create_dir_all(path).map_err(|source| UtilError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Remove a directory and all its contents. No error if the directory is absent.
///
/// # Errors
/// Returns an error if the directory exists but cannot be removed.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<(), UtilError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(UtilError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Make `dir` an empty, existing directory.
///
/// Any previous content (files, nested folders) is deleted first, so nothing
/// from an earlier extraction survives.
///
/// # Errors
/// Returns an error if the old tree cannot be removed or the directory cannot
/// be recreated.
pub fn reset_dir(dir: &Path) -> Result<(), UtilError> {
    if dir.is_file() {
        std::fs::remove_file(dir).map_err(|source| UtilError::Io {
            path: dir.display().to_string(),
            source,
        })?;
    }
    remove_dir_all_if_exists(dir)?;
    ensure_dir(dir)
}

/// Make `path` absolute against `base` without touching the filesystem.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Collect the files under `dir` matching a glob `pattern`, sorted by path.
///
/// Directories matched by the pattern are ignored. A missing `dir` yields an
/// empty list, the same as a tree with no matches.
///
/// # Errors
/// Returns an error if the glob pattern is invalid.
pub fn collect_matching(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, UtilError> {
    let full_pattern = dir.join(pattern);
    let full_pattern_str = full_pattern.display().to_string();

    let mut paths: Vec<PathBuf> = glob::glob(&full_pattern_str)
        .map_err(|e| UtilError::GlobPattern {
            pattern: full_pattern_str.clone(),
            message: e.to_string(),
        })?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();

    paths.sort();
    Ok(paths)
}
