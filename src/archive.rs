//! Archive unpacking.
//!
//! The format is sniffed from the file content with `infer`; the extension
//! only decided that the file *should* be an archive. Supported: zip, tar,
//! gzip (a gzipped tar is unpacked, any other gzip stream is written out as a
//! single file).
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bytes read for format detection. Covers the tar magic at offset 257.
const SNIFF_LEN: u64 = 1024;

/// Errors raised while unpacking.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The content matches no supported format.
    #[error("unrecognized archive format")]
    NotAnArchive(PathBuf),

    /// The format was recognized but unpacking failed part-way.
    #[error("corrupt archive: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Detected container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    Gzip,
}

impl ArchiveFormat {
    /// Detects the format from leading bytes.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if infer::archive::is_zip(header) {
            Some(Self::Zip)
        } else if infer::archive::is_gz(header) {
            Some(Self::Gzip)
        } else if infer::archive::is_tar(header) {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Detects the format of the file at `path`.
    pub fn detect(path: &Path) -> io::Result<Option<Self>> {
        let mut header = Vec::with_capacity(SNIFF_LEN as usize);
        File::open(path)?.take(SNIFF_LEN).read_to_end(&mut header)?;
        Ok(Self::sniff(&header))
    }
}

/// Unpacks `archive` into `dest`, which must already exist.
///
/// Returns the detected format. On error `dest` may hold partial output; the
/// caller owns cleanup.
pub fn extract(archive: &Path, dest: &Path) -> Result<ArchiveFormat, ArchiveError> {
    let format = ArchiveFormat::detect(archive)?
        .ok_or_else(|| ArchiveError::NotAnArchive(archive.to_path_buf()))?;
    debug!(archive = %archive.display(), ?format, "unpacking");

    let corrupt = |reason: String| ArchiveError::Corrupt {
        path: archive.to_path_buf(),
        reason,
    };

    match format {
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(BufReader::new(File::open(archive)?))
                .map_err(|e| corrupt(e.to_string()))?;
            zip.extract(dest).map_err(|e| corrupt(e.to_string()))?;
        }
        ArchiveFormat::Tar => {
            tar::Archive::new(BufReader::new(File::open(archive)?))
                .unpack(dest)
                .map_err(|e| corrupt(e.to_string()))?;
        }
        ArchiveFormat::Gzip => extract_gzip(archive, dest).map_err(|e| corrupt(e.to_string()))?,
    }
    Ok(format)
}

fn extract_gzip(archive: &Path, dest: &Path) -> io::Result<()> {
    let mut inner = Vec::with_capacity(SNIFF_LEN as usize);
    GzDecoder::new(File::open(archive)?)
        .take(SNIFF_LEN)
        .read_to_end(&mut inner)?;

    let mut decoder = GzDecoder::new(BufReader::new(File::open(archive)?));
    if infer::archive::is_tar(&inner) {
        return tar::Archive::new(decoder).unpack(dest);
    }

    let mut out = File::create(dest.join(gzip_member_name(archive)))?;
    io::copy(&mut decoder, &mut out)?;
    Ok(())
}

/// `notes.txt.gz` unpacks to `notes.txt`.
fn gzip_member_name(archive: &Path) -> PathBuf {
    archive
        .file_stem()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("unpacked"))
}

/// Removes `dir` and everything below it, ignoring a missing directory.
pub fn discard_output(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_tar<W: Write>(writer: W, name: &str, data: &[u8]) -> io::Result<W> {
        let mut builder = tar::Builder::new(writer);
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data)?;
        builder.into_inner()
    }

    #[test]
    fn test_sniff_rejects_plain_text() {
        assert_eq!(ArchiveFormat::sniff(b"definitely not an archive"), None);
        assert_eq!(ArchiveFormat::sniff(b""), None);
    }

    #[test]
    fn test_sniff_zip_magic() {
        assert_eq!(
            ArchiveFormat::sniff(&[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00]),
            Some(ArchiveFormat::Zip)
        );
    }

    #[test]
    fn test_extract_rejects_fake_archive() {
        let tmp = TempDir::new().expect("Failed to create temp directory");
        let fake = tmp.path().join("fake.zip");
        fs::write(&fake, "just text").expect("Failed to write fake archive");
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).expect("Failed to create dest");

        let result = extract(&fake, &dest);
        assert!(matches!(result, Err(ArchiveError::NotAnArchive(_))));
    }

    #[test]
    fn test_extract_tar() {
        let tmp = TempDir::new().expect("Failed to create temp directory");
        let archive = tmp.path().join("bundle.tar");
        let file = File::create(&archive).expect("Failed to create tar");
        write_tar(file, "inside.txt", b"hello").expect("Failed to write tar");
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).expect("Failed to create dest");

        assert_eq!(extract(&archive, &dest).unwrap(), ArchiveFormat::Tar);
        assert_eq!(fs::read_to_string(dest.join("inside.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_extract_tar_gz() {
        let tmp = TempDir::new().expect("Failed to create temp directory");
        let archive = tmp.path().join("bundle.tar.gz");
        let file = File::create(&archive).expect("Failed to create tar.gz");
        let encoder = write_tar(GzEncoder::new(file, Compression::default()), "a.txt", b"tgz")
            .expect("Failed to write tar");
        encoder.finish().expect("Failed to finish gzip");
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).expect("Failed to create dest");

        assert_eq!(extract(&archive, &dest).unwrap(), ArchiveFormat::Gzip);
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "tgz");
    }

    #[test]
    fn test_extract_single_file_gzip() {
        let tmp = TempDir::new().expect("Failed to create temp directory");
        let archive = tmp.path().join("notes.txt.gz");
        let mut encoder = GzEncoder::new(
            File::create(&archive).expect("Failed to create gz"),
            Compression::default(),
        );
        encoder.write_all(b"plain notes").unwrap();
        encoder.finish().unwrap();
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).expect("Failed to create dest");

        extract(&archive, &dest).unwrap();
        assert_eq!(
            fs::read_to_string(dest.join("notes.txt")).unwrap(),
            "plain notes"
        );
    }

    #[test]
    fn test_truncated_gzip_is_corrupt() {
        let tmp = TempDir::new().expect("Failed to create temp directory");
        let archive = tmp.path().join("broken.gz");
        fs::write(&archive, [0x1f, 0x8b, 0x08, 0x00, 0x00]).unwrap();
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).unwrap();

        assert!(matches!(
            extract(&archive, &dest),
            Err(ArchiveError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_discard_output_tolerates_missing_dir() {
        let tmp = TempDir::new().expect("Failed to create temp directory");
        assert!(discard_output(&tmp.path().join("missing")).is_ok());
    }
}
