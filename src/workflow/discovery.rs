use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{PreflightError, Result};

const WORKFLOW_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Lists the workflow definition files directly under `root`.
///
/// Files with a `.yml` or `.yaml` extension are returned, sorted by path so
/// that every run visits documents in the same order. Symlinks are followed.
/// An entry whose metadata cannot be read is still returned, so the read
/// failure is recorded against it instead of the file silently disappearing.
///
/// # Errors
///
/// Returns [`PreflightError::RootNotFound`] if `root` does not exist or is not
/// a directory, and an IO error if the directory cannot be listed.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PreflightError::RootNotFound(root.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                warn!("Skipping unreadable entry in {}: {err}", root.display());
                continue;
            }
        };

        let is_workflow = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| WORKFLOW_EXTENSIONS.contains(&ext));

        if !is_workflow {
            debug!("Skipping non-workflow file: {}", path.display());
            continue;
        }

        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => paths.push(path),
            Ok(_) => debug!("Skipping non-file entry: {}", path.display()),
            Err(err) => {
                warn!("Cannot stat {}: {err}", path.display());
                paths.push(path);
            }
        }
    }

    paths.sort();
    Ok(paths)
}
