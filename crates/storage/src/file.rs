//! Candidate file handles.
//!
//! A [`RomFile`] is an immutable handle to a located byte sequence,
//! either a file sitting on disk or an entry inside an archive. The
//! expensive part (reading the bytes to fingerprint them and sniff for a
//! ROM-format header) is deferred until somebody asks and memoised
//! forever after, so handles are cheap to create in bulk during a scan
//! and safe to fingerprint concurrently.

use crate::archive::ArchiveKind;
use crate::error::{ErrorKind, Result};
use crate::header::{self, RomHeader};
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// The two viewpoints a file can be fingerprinted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprints {
    /// CRC32 of the file's natural bytes.
    pub raw: String,
    /// CRC32 after skipping a detected ROM-format header; only present
    /// when a header was detected.
    pub stripped: Option<String>,
    /// The detected header, when there is one.
    pub header: Option<RomHeader>,
}

impl Fingerprints {
    fn from_bytes(bytes: &[u8]) -> Self {
        let probe = &bytes[..bytes.len().min(header::PROBE_LEN)];
        let header = header::detect(probe);
        let stripped = header.map(|h| {
            let data = &bytes[h.data_offset().min(bytes.len())..];
            crc32_hex(data)
        });
        Self { raw: crc32_hex(bytes), stripped, header }
    }
}

fn crc32_hex(bytes: &[u8]) -> String {
    format!("{:08x}", crc32fast::hash(bytes))
}

/// An immutable handle to a candidate file, possibly inside an archive.
///
/// Two handles with equal fingerprints are byte-equivalent at that
/// viewpoint; everything downstream (indexing, matching, the same-file
/// preference games) leans on that invariant.
#[derive(Debug)]
pub struct RomFile {
    path: PathBuf,
    entry_path: Option<PathBuf>,
    size: u64,
    archive: Option<ArchiveKind>,
    /// CRC32 supplied by an archive listing; lets [`fingerprints`](Self::fingerprints)
    /// answer without extracting the entry.
    seeded_crc: Option<String>,
    fingerprints: OnceCell<Fingerprints>,
}

impl RomFile {
    /// Create a handle for a plain on-disk file, reading only its
    /// metadata.
    ///
    /// # Errors
    /// [`NotFound`](ErrorKind::NotFound) when the path does not exist;
    /// [`Io`](ErrorKind::Io) for anything else the filesystem objects to.
    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let meta = tokio::fs::metadata(&path).await.map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.clone()),
            _ => ErrorKind::Io(err),
        })?;
        Ok(Self {
            path,
            entry_path: None,
            size: meta.len(),
            archive: None,
            seeded_crc: None,
            fingerprints: OnceCell::new(),
        })
    }

    /// Create a handle for an entry inside an archive, from its listing
    /// record. A listing-supplied CRC32 seeds the raw fingerprint so the
    /// entry never needs extraction just to be indexed.
    pub fn archive_entry(
        archive_path: impl Into<PathBuf>,
        kind: ArchiveKind,
        entry_path: impl Into<PathBuf>,
        size: u64,
        crc32: Option<String>,
    ) -> Self {
        Self {
            path: archive_path.into(),
            entry_path: Some(entry_path.into()),
            size,
            archive: Some(kind),
            seeded_crc: crc32,
            fingerprints: OnceCell::new(),
        }
    }

    /// Path on disk: the file itself, or the containing archive for an
    /// entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry path within the containing archive, when this handle points
    /// inside one.
    pub fn entry_path(&self) -> Option<&Path> {
        self.entry_path.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn archive_kind(&self) -> Option<ArchiveKind> {
        self.archive
    }

    pub fn is_archived(&self) -> bool {
        self.archive.is_some()
    }

    /// Both fingerprint viewpoints, computed on first call and memoised.
    ///
    /// Plain files are read in full; archive entries are extracted into a
    /// per-call scratch directory through their adapter, unless the
    /// listing already supplied a CRC32, in which case that answer is
    /// used as-is (no header sniffing happens for such entries; the
    /// bytes were never read).
    ///
    /// Concurrent callers coalesce onto one computation.
    pub async fn fingerprints(&self) -> Result<&Fingerprints> {
        self.fingerprints
            .get_or_try_init(|| async {
                if let Some(crc) = &self.seeded_crc {
                    return Ok(Fingerprints { raw: crc.clone(), stripped: None, header: None });
                }
                let bytes = self.read_bytes().await?;
                Ok(Fingerprints::from_bytes(&bytes))
            })
            .await
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        match (self.archive, &self.entry_path) {
            (Some(kind), Some(entry)) => {
                let scratch = tempfile::tempdir().map_err(ErrorKind::Io)?;
                let destination = scratch.path().join("entry.bin");
                kind.adapter().extract(&self.path, entry, &destination).await?;
                let bytes = tokio::fs::read(&destination).await.map_err(ErrorKind::Io)?;
                Ok(bytes)
            },
            _ => tokio::fs::read(&self.path).await.map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => ErrorKind::NotFound(self.path.clone()).into(),
                _ => ErrorKind::Io(err).into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_plain_file_fingerprints() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("plain.rom");
        std::fs::write(&path, b"cartridge bytes").unwrap();
        let file = RomFile::from_path(&path).await.unwrap();
        assert_eq!(file.size(), 15);
        assert!(!file.is_archived());
        let prints = file.fingerprints().await.unwrap();
        assert_eq!(prints.raw, format!("{:08x}", crc32fast::hash(b"cartridge bytes")));
        assert!(prints.stripped.is_none());
        assert!(prints.header.is_none());
    }

    #[tokio::test]
    async fn test_headered_file_gets_both_viewpoints() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("game.nes");
        let mut bytes = vec![0u8; 16];
        bytes[..4].copy_from_slice(b"NES\x1a");
        bytes.extend_from_slice(b"PRG-ROM CONTENTS");
        std::fs::write(&path, &bytes).unwrap();

        let file = RomFile::from_path(&path).await.unwrap();
        let prints = file.fingerprints().await.unwrap();
        assert_eq!(prints.header.unwrap().name, "ines");
        assert_eq!(prints.raw, format!("{:08x}", crc32fast::hash(&bytes)));
        assert_eq!(
            prints.stripped.as_deref(),
            Some(&format!("{:08x}", crc32fast::hash(b"PRG-ROM CONTENTS"))[..])
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = RomFile::from_path("/definitely/missing.rom").await.unwrap_err();
        assert!(matches!(err.as_error(), ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_seeded_entry_skips_extraction() {
        // The archive path doesn't even exist; a seeded CRC must answer
        // without touching it.
        let file = RomFile::archive_entry(
            "/missing/archive.zip",
            ArchiveKind::Zip,
            "inner/a.rom",
            4,
            Some("0007a2be".to_string()),
        );
        let prints = file.fingerprints().await.unwrap();
        assert_eq!(prints.raw, "0007a2be");
        assert!(prints.stripped.is_none());
    }

    #[tokio::test]
    async fn test_unseeded_zip_entry_extracts_and_hashes() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("fixture.zip");
        let zip_file = std::fs::File::create(&archive).unwrap();
        let mut writer = ::zip::ZipWriter::new(zip_file);
        writer.start_file("inner/a.rom", ::zip::write::SimpleFileOptions::default()).unwrap();
        writer.write_all(b"aaaa").unwrap();
        writer.finish().unwrap();

        let file = RomFile::archive_entry(&archive, ArchiveKind::Zip, "inner/a.rom", 4, None);
        let prints = file.fingerprints().await.unwrap();
        assert_eq!(prints.raw, format!("{:08x}", crc32fast::hash(b"aaaa")));
    }

    #[tokio::test]
    async fn test_fingerprints_are_memoised() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("memo.rom");
        std::fs::write(&path, b"first contents").unwrap();
        let file = RomFile::from_path(&path).await.unwrap();
        let first = file.fingerprints().await.unwrap().raw.clone();
        // Rewrite the file; the memoised answer must not change.
        std::fs::write(&path, b"second contents").unwrap();
        let second = file.fingerprints().await.unwrap().raw.clone();
        assert_eq!(first, second);
    }
}
