//! Removal of source folders emptied by a run.
use crate::error::RelocateError;
use crate::fs_ops::FileSystem;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What the cleanup pass did.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Folders removed, in removal order.
    pub removed: Vec<PathBuf>,
    /// Folders that could not be removed.
    pub failed: Vec<RelocateError>,
}

/// Removes `dirs` in reverse discovery order.
///
/// `dirs` must list parents before their children (breadth-first discovery
/// does), so children are always attempted first. A folder that is already
/// gone is skipped; a folder that cannot be removed is reported and the pass
/// moves on.
pub fn remove_empty_dirs(fs: &dyn FileSystem, dirs: &[PathBuf]) -> CleanupReport {
    let mut report = CleanupReport::default();
    for dir in dirs.iter().rev() {
        match remove_one(fs, dir) {
            Ok(true) => report.removed.push(dir.clone()),
            Ok(false) => {}
            Err(e) => {
                warn!("{e}");
                report.failed.push(e);
            }
        }
    }
    report
}

fn remove_one(fs: &dyn FileSystem, dir: &Path) -> Result<bool, RelocateError> {
    if !fs.exists(dir) {
        debug!(dir = %dir.display(), "already gone");
        return Ok(false);
    }
    fs.remove_empty_directory(dir)
        .map(|()| {
            debug!(dir = %dir.display(), "removed");
            true
        })
        .map_err(|e| RelocateError::DirectoryNotEmpty {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })
}
