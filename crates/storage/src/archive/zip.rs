//! Zip adapter.
//!
//! Zip central directories store per-entry CRC32s, which happens to be
//! exactly the fingerprint the catalog world speaks. Listing a zip
//! therefore fingerprints its contents for free.

use super::{Archive, ArchiveKind, EntryMeta, crc32_hex, prepare_destination};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct ZipAdapter;

#[async_trait]
impl Archive for ZipAdapter {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Zip
    }

    async fn entries(&self, archive: &Path, crc32: bool) -> Result<Vec<EntryMeta>> {
        let archive = archive.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let file = std::fs::File::open(&archive).map_err(ErrorKind::Io)?;
            let mut zip = zip::ZipArchive::new(file).map_err(|err| {
                tracing::debug!(archive = %archive.display(), %err, "failed to open zip");
                ErrorKind::Archive(archive.clone())
            })?;
            let mut entries = Vec::with_capacity(zip.len());
            for index in 0..zip.len() {
                let entry = zip.by_index(index).map_err(|err| {
                    tracing::debug!(archive = %archive.display(), index, %err, "failed to read zip entry");
                    ErrorKind::Archive(archive.clone())
                })?;
                if entry.is_dir() {
                    continue;
                }
                entries.push(EntryMeta {
                    path: PathBuf::from(entry.name()),
                    size: entry.size(),
                    crc32: crc32.then(|| crc32_hex(entry.crc32())),
                });
            }
            Ok(entries)
        })
        .await
        .map_err(|_| ErrorKind::Task)?
    }

    async fn extract(&self, archive: &Path, entry: &Path, destination: &Path) -> Result<()> {
        let archive = archive.to_path_buf();
        let entry = entry.to_string_lossy().into_owned();
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let file = std::fs::File::open(&archive).map_err(ErrorKind::Io)?;
            let mut zip = zip::ZipArchive::new(file).map_err(|err| {
                tracing::debug!(archive = %archive.display(), %err, "failed to open zip");
                ErrorKind::Archive(archive.clone())
            })?;
            let mut source = zip
                .by_name(&entry)
                .map_err(|_| ErrorKind::EntryMissing(PathBuf::from(&entry)))?;
            prepare_destination(&destination).map_err(ErrorKind::Io)?;
            let mut out = std::fs::File::create(&destination).map_err(ErrorKind::Io)?;
            std::io::copy(&mut source, &mut out).map_err(ErrorKind::Io)?;
            Ok(())
        })
        .await
        .map_err(|_| ErrorKind::Task)?
    }
}
