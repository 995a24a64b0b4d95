//! Filesystem capabilities the organizer relies on.
//!
//! The engine only touches the disk through [`FileSystem`], so a run can be
//! observed or perturbed in tests by wrapping [`LocalFileSystem`].
use crate::archive::{self, ArchiveError, ArchiveFormat};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Kind of a directory entry. Symlinks are reported as `Other` and never
/// followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// One entry returned by [`FileSystem::list_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl DirEntryInfo {
    /// File name as a lossy string.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Filesystem operations used while organizing.
pub trait FileSystem: Send + Sync {
    /// Lists the immediate entries of `path`, sorted by path.
    fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>>;

    fn exists(&self, path: &Path) -> bool;

    /// Creates `path` and its parents. An existing directory is not an error.
    fn create_directory(&self, path: &Path) -> io::Result<()>;

    /// Creates the single directory `path`. Fails with `AlreadyExists` if it
    /// is already there, so two callers never get the same folder.
    fn create_new_directory(&self, path: &Path) -> io::Result<()>;

    /// Renames `src` to `dst`, replacing an existing file at `dst`.
    fn move_file(&self, src: &Path, dst: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Removes `path` only if it is empty.
    fn remove_empty_directory(&self, path: &Path) -> io::Result<()>;

    /// Removes `path` with all of its contents.
    fn remove_directory_tree(&self, path: &Path) -> io::Result<()>;

    /// Unpacks `archive` into the existing directory `dest`.
    fn extract_archive(&self, archive: &Path, dest: &Path) -> Result<ArchiveFormat, ArchiveError>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::Other
            };
            entries.push(DirEntryInfo {
                path: entry.path(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn create_new_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn move_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        fs::rename(src, dst)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_empty_directory(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn remove_directory_tree(&self, path: &Path) -> io::Result<()> {
        archive::discard_output(path)
    }

    fn extract_archive(&self, archive: &Path, dest: &Path) -> Result<ArchiveFormat, ArchiveError> {
        archive::extract(archive, dest)
    }
}
