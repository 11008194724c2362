//! Project root discovery and validation.

use crate::{Error, Result, MARKER_FILE};
use std::path::{Path, PathBuf};

/// Walk upward from `start` until a directory containing the marker file is found.
pub fn find_project_root(start: impl AsRef<Path>) -> Result<PathBuf> {
    start
        .as_ref()
        .ancestors()
        .find(|dir| dir.join(MARKER_FILE).is_file())
        .map(Path::to_path_buf)
        .ok_or(Error::ProjectRootNotFound)
}

/// Check that an explicitly requested root exists and carries the marker file.
pub fn validate_project_root(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(Error::RootMissing(dir.to_path_buf()));
    }
    if !dir.join(MARKER_FILE).is_file() {
        return Err(Error::RootWithoutMarker(dir.to_path_buf()));
    }
    Ok(())
}

/// Resolve the project root for this invocation.
///
/// An explicit root is validated; otherwise the current directory and its
/// parents are searched. The result is absolute with symlinks resolved.
pub fn resolve_project_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let root = match explicit {
        Some(dir) => {
            validate_project_root(dir)?;
            dir.to_path_buf()
        }
        None => {
            let cwd = std::env::current_dir().map_err(Error::CurrentDir)?;
            find_project_root(cwd)?
        }
    };
    std::fs::canonicalize(&root).map_err(|source| Error::Io { path: root, source })
}
