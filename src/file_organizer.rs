//! Moving and unpacking single files into the organized tree.
//!
//! [`FileOrganizer::relocate`] takes one scanned file and its route and
//! performs the side effects: create the destination folder, move the file
//! under its transliterated name, or unpack an archive into its own folder.
//! A file that vanished in the meantime is a no-op, not an error.
use crate::archive::ArchiveError;
use crate::error::RelocateError;
use crate::file_category::{Category, Route, extension_of};
use crate::fs_ops::{EntryKind, FileSystem};
use crate::transliterate::{normalize_file_name, transliterate};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Staging folder names tried per archive before giving up.
const MAX_STAGING_ATTEMPTS: usize = 64;

/// A file found during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Uppercase extension without the dot, empty if none.
    pub extension: String,
    /// Folder the file was found in.
    pub dir: PathBuf,
}

impl FileEntry {
    pub fn new(path: PathBuf) -> Self {
        let extension = extension_of(&path);
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            extension,
            dir,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without its last extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Outcome of relocating one file.
#[derive(Debug)]
pub enum Relocation {
    /// The file now lives at `to`.
    Moved { from: PathBuf, to: PathBuf },
    /// The archive was unpacked into `into` and deleted.
    Extracted { archive: PathBuf, into: PathBuf },
    /// Nothing was moved; `reason` says why. The file, if it still exists,
    /// stays where it was.
    Skipped { path: PathBuf, reason: RelocateError },
}

impl Relocation {
    /// Destination of a completed relocation.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            Relocation::Moved { to, .. } => Some(to),
            Relocation::Extracted { into, .. } => Some(into),
            Relocation::Skipped { .. } => None,
        }
    }
}

/// Performs relocations below one root directory.
pub struct FileOrganizer<'a> {
    root: &'a Path,
    fs: &'a dyn FileSystem,
}

impl<'a> FileOrganizer<'a> {
    pub fn new(root: &'a Path, fs: &'a dyn FileSystem) -> Self {
        Self { root, fs }
    }

    /// Relocates `entry` according to `route`.
    ///
    /// # Returns
    ///
    /// `Ok` for completed work and for recovered conditions
    /// ([`Relocation::Skipped`]); `Err` when a folder could not be created or
    /// the move or delete itself failed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::file_category::RoutingTable;
    /// use dirsort::file_organizer::{FileEntry, FileOrganizer};
    /// use dirsort::fs_ops::LocalFileSystem;
    /// use std::path::{Path, PathBuf};
    ///
    /// let root = Path::new("/data/inbox");
    /// let entry = FileEntry::new(PathBuf::from("/data/inbox/misc/report.PDF"));
    /// let route = RoutingTable::default().classify(&entry.extension);
    /// let outcome = FileOrganizer::new(root, &LocalFileSystem).relocate(&entry, &route);
    /// println!("{:?}", outcome);
    /// ```
    pub fn relocate(&self, entry: &FileEntry, route: &Route) -> Result<Relocation, RelocateError> {
        if !self.fs.exists(&entry.path) {
            return Ok(vanished(&entry.path));
        }

        let target_dir = route.target_dir(self.root);
        match route.category {
            Category::Archives => self.handle_archive(entry, &target_dir),
            Category::Images | Category::Video | Category::Documents | Category::Audio => {
                self.handle_media(entry, &target_dir)
            }
            Category::Other => self.handle_other(entry, &target_dir),
        }
    }

    fn handle_media(&self, entry: &FileEntry, target_dir: &Path) -> Result<Relocation, RelocateError> {
        self.move_into(entry, target_dir)
    }

    fn handle_other(&self, entry: &FileEntry, target_dir: &Path) -> Result<Relocation, RelocateError> {
        debug!(file = %entry.path.display(), extension = %entry.extension, "no route, using other files");
        self.move_into(entry, target_dir)
    }

    /// Moves the file under its normalized name. An existing file with the
    /// same name is replaced.
    fn move_into(&self, entry: &FileEntry, target_dir: &Path) -> Result<Relocation, RelocateError> {
        self.ensure_dir(target_dir)?;

        let destination = target_dir.join(normalize_file_name(&entry.file_name()));
        if self.fs.exists(&destination) {
            debug!(destination = %destination.display(), "overwriting existing file");
        }

        match self.fs.move_file(&entry.path, &destination) {
            Ok(()) => {
                debug!(from = %entry.path.display(), to = %destination.display(), "moved");
                Ok(Relocation::Moved {
                    from: entry.path.clone(),
                    to: destination,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !self.fs.exists(&entry.path) => {
                Ok(vanished(&entry.path))
            }
            Err(e) => Err(RelocateError::MoveFailed {
                from: entry.path.clone(),
                to: destination,
                source: e,
            }),
        }
    }

    /// Unpacks the archive into `target_dir/<transliterated stem>`.
    ///
    /// The archive is first unpacked into a staging folder that only this
    /// call owns, then merged into the unpack folder. On failure only the
    /// staging folder is removed and the archive is left in place; the unpack
    /// folder may be shared with other workers and is never deleted.
    fn handle_archive(&self, entry: &FileEntry, target_dir: &Path) -> Result<Relocation, RelocateError> {
        self.ensure_dir(target_dir)?;

        let name = transliterate(&entry.stem());
        let unpack_dir = target_dir.join(&name);
        let staging = self.create_staging_dir(target_dir, &name)?;

        if let Err(e) = self.fs.extract_archive(&entry.path, &staging) {
            self.discard_staging(&staging);
            return Ok(match e {
                ArchiveError::Io(io_err)
                    if io_err.kind() == io::ErrorKind::NotFound && !self.fs.exists(&entry.path) =>
                {
                    vanished(&entry.path)
                }
                other => {
                    let reason = RelocateError::NotAnArchive {
                        path: entry.path.clone(),
                        reason: other.to_string(),
                    };
                    warn!("{reason}; leaving it in place");
                    Relocation::Skipped {
                        path: entry.path.clone(),
                        reason,
                    }
                }
            });
        }

        if let Err(e) = self.publish(&staging, &unpack_dir) {
            self.discard_staging(&staging);
            return Err(RelocateError::MoveFailed {
                from: staging,
                to: unpack_dir,
                source: e,
            });
        }

        if self.fs.exists(&entry.path) {
            self.fs
                .remove_file(&entry.path)
                .map_err(|e| RelocateError::RemoveFailed {
                    path: entry.path.clone(),
                    source: e,
                })?;
        } else {
            warn!(archive = %entry.path.display(), "archive vanished after unpacking");
        }

        info!(archive = %entry.path.display(), into = %unpack_dir.display(), "unpacked");
        Ok(Relocation::Extracted {
            archive: entry.path.clone(),
            into: unpack_dir,
        })
    }

    /// Creates `.<name>.partial-<n>` under `target_dir` with the first free `n`.
    fn create_staging_dir(&self, target_dir: &Path, name: &str) -> Result<PathBuf, RelocateError> {
        let mut last_error = None;
        for attempt in 0..MAX_STAGING_ATTEMPTS {
            let candidate = target_dir.join(format!(".{name}.partial-{attempt}"));
            match self.fs.create_new_directory(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_error = Some(e),
                Err(e) => {
                    return Err(RelocateError::DirectoryCreationFailed {
                        path: candidate,
                        source: e,
                    });
                }
            }
        }
        Err(RelocateError::DirectoryCreationFailed {
            path: target_dir.join(format!(".{name}.partial")),
            source: last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::AlreadyExists)),
        })
    }

    /// Moves the staged output into `unpack_dir`. A rename is enough while
    /// `unpack_dir` does not exist; otherwise the trees are merged and files
    /// already present are replaced.
    fn publish(&self, staging: &Path, unpack_dir: &Path) -> io::Result<()> {
        if !self.fs.exists(unpack_dir) && self.fs.move_file(staging, unpack_dir).is_ok() {
            return Ok(());
        }
        debug!(into = %unpack_dir.display(), "merging into existing unpack folder");
        self.merge_dir(staging, unpack_dir)
    }

    fn merge_dir(&self, from: &Path, into: &Path) -> io::Result<()> {
        self.fs.create_directory(into)?;
        for entry in self.fs.list_directory(from)? {
            let dest = into.join(entry.path.file_name().unwrap_or_default());
            match entry.kind {
                EntryKind::Directory => self.merge_dir(&entry.path, &dest)?,
                EntryKind::File | EntryKind::Other => self.fs.move_file(&entry.path, &dest)?,
            }
        }
        self.fs.remove_empty_directory(from)
    }

    fn discard_staging(&self, staging: &Path) {
        if let Err(e) = self.fs.remove_directory_tree(staging) {
            warn!(dir = %staging.display(), error = %e, "failed to remove staging folder");
        }
    }

    fn ensure_dir(&self, dir: &Path) -> Result<(), RelocateError> {
        self.fs
            .create_directory(dir)
            .map_err(|e| RelocateError::DirectoryCreationFailed {
                path: dir.to_path_buf(),
                source: e,
            })
    }
}

fn vanished(path: &Path) -> Relocation {
    let reason = RelocateError::SourceVanished {
        path: path.to_path_buf(),
    };
    warn!("{reason}, skipping");
    Relocation::Skipped {
        path: path.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::RoutingTable;
    use crate::fs_ops::LocalFileSystem;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn relocate(root: &Path, file: &Path) -> Result<Relocation, RelocateError> {
        let entry = FileEntry::new(file.to_path_buf());
        let route = RoutingTable::default().classify(&entry.extension);
        FileOrganizer::new(root, &LocalFileSystem).relocate(&entry, &route)
    }

    fn write_zip(path: &Path, name: &str, data: &[u8]) {
        let mut zip = zip::ZipWriter::new(fs::File::create(path).expect("Failed to create zip"));
        zip.start_file(name, zip::write::SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        zip.write_all(data).expect("Failed to write zip entry");
        zip.finish().expect("Failed to finish zip");
    }

    #[test]
    fn test_file_entry_fields() {
        let entry = FileEntry::new(PathBuf::from("/in/sub/Photo.Jpg"));
        assert_eq!(entry.extension, "JPG");
        assert_eq!(entry.dir, PathBuf::from("/in/sub"));
        assert_eq!(entry.file_name(), "Photo.Jpg");
        assert_eq!(entry.stem(), "Photo");
    }

    #[test]
    fn test_document_is_moved_under_subtype() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("misc")).unwrap();
        let file = root.join("misc").join("report.PDF");
        fs::write(&file, "pdf").unwrap();

        let outcome = relocate(root, &file).expect("relocation failed");

        let expected = root.join("documents").join("PDF").join("report.PDF");
        assert_eq!(outcome.destination(), Some(expected.as_path()));
        assert!(expected.exists());
        assert!(!file.exists());
    }

    #[test]
    fn test_cyrillic_name_is_transliterated() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let file = root.join("фото літо.jpg");
        fs::write(&file, "jpg").unwrap();

        relocate(root, &file).expect("relocation failed");

        assert!(root.join("images/JPG/foto_ljeto.jpg").exists());
    }

    #[test]
    fn test_unknown_extension_goes_to_other_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let file = root.join("data.xyz123");
        fs::write(&file, "?").unwrap();

        relocate(root, &file).expect("relocation failed");

        assert!(root.join("other files").join("data.xyz123").exists());
    }

    #[test]
    fn test_existing_destination_is_overwritten() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("images/PNG")).unwrap();
        fs::write(root.join("images/PNG/a.png"), "old").unwrap();
        let file = root.join("a.png");
        fs::write(&file, "new").unwrap();

        relocate(root, &file).expect("relocation failed");

        assert_eq!(fs::read_to_string(root.join("images/PNG/a.png")).unwrap(), "new");
    }

    #[test]
    fn test_vanished_source_is_a_no_op() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        let outcome = relocate(root, &root.join("ghost.jpg")).expect("should not fail");

        assert!(matches!(
            outcome,
            Relocation::Skipped {
                reason: RelocateError::SourceVanished { .. },
                ..
            }
        ));
        assert!(!root.join("images").exists());
    }

    #[test]
    fn test_zip_is_unpacked_and_removed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let file = root.join("архів.zip");
        write_zip(&file, "inside.txt", b"zipped");

        let outcome = relocate(root, &file).expect("relocation failed");

        let unpacked = root.join("archives/ZIP/arhjev");
        assert!(matches!(outcome, Relocation::Extracted { .. }));
        assert_eq!(fs::read_to_string(unpacked.join("inside.txt")).unwrap(), "zipped");
        assert!(!file.exists());
        // only the unpack folder, no staging leftovers
        assert_eq!(fs::read_dir(root.join("archives/ZIP")).unwrap().count(), 1);
    }

    #[test]
    fn test_unpack_merges_into_existing_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let earlier = root.join("archives/ZIP/pack");
        fs::create_dir_all(&earlier).unwrap();
        fs::write(earlier.join("old.txt"), "old").unwrap();
        let file = root.join("pack.zip");
        write_zip(&file, "new.txt", b"new");

        let outcome = relocate(root, &file).expect("relocation failed");

        assert!(matches!(outcome, Relocation::Extracted { .. }));
        assert_eq!(fs::read_to_string(earlier.join("old.txt")).unwrap(), "old");
        assert_eq!(fs::read_to_string(earlier.join("new.txt")).unwrap(), "new");
        assert_eq!(fs::read_dir(root.join("archives/ZIP")).unwrap().count(), 1);
    }

    #[test]
    fn test_fake_zip_is_kept_and_folder_removed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let file = root.join("fake.zip");
        fs::write(&file, "not a zip at all").unwrap();

        let outcome = relocate(root, &file).expect("should not fail");

        assert!(matches!(
            outcome,
            Relocation::Skipped {
                reason: RelocateError::NotAnArchive { .. },
                ..
            }
        ));
        assert!(file.exists());
        assert!(!root.join("archives/ZIP/fake").exists());
        assert_eq!(fs::read_dir(root.join("archives/ZIP")).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_unpack_keeps_preexisting_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let earlier = root.join("archives/ZIP/fake");
        fs::create_dir_all(&earlier).unwrap();
        fs::write(earlier.join("from_last_run.txt"), "keep me").unwrap();
        let file = root.join("fake.zip");
        fs::write(&file, "still not a zip").unwrap();

        relocate(root, &file).expect("should not fail");

        assert!(earlier.join("from_last_run.txt").exists());
        assert!(file.exists());
    }
}
