//! Rar adapter.
//!
//! Rar is read through the vendor library's cursor API: listing walks
//! header-to-header, extraction replays the walk and unpacks the one
//! entry we care about into a scratch directory before moving it into
//! place. The library offers no stable per-entry checksum surface, so
//! listings carry no CRC32s and fingerprints come from the extracted
//! bytes instead.

use super::{Archive, ArchiveKind, EntryMeta, prepare_destination};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::path::Path;

pub struct RarAdapter;

#[async_trait]
impl Archive for RarAdapter {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Rar
    }

    async fn entries(&self, archive: &Path, _crc32: bool) -> Result<Vec<EntryMeta>> {
        let archive = archive.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let listing = unrar::Archive::new(&archive).open_for_listing().map_err(|err| {
                tracing::debug!(archive = %archive.display(), %err, "failed to open rar");
                ErrorKind::Archive(archive.clone())
            })?;
            let mut entries = Vec::new();
            for header in listing {
                let header = header.map_err(|err| {
                    tracing::debug!(archive = %archive.display(), %err, "failed to read rar header");
                    ErrorKind::Archive(archive.clone())
                })?;
                if header.is_directory() {
                    continue;
                }
                entries.push(EntryMeta {
                    path: header.filename.clone(),
                    size: header.unpacked_size as u64,
                    crc32: None,
                });
            }
            Ok(entries)
        })
        .await
        .map_err(|_| ErrorKind::Task)?
    }

    async fn extract(&self, archive: &Path, entry: &Path, destination: &Path) -> Result<()> {
        let archive = archive.to_path_buf();
        let entry = entry.to_path_buf();
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || {
            // Per-extraction scratch directory, released on every exit path.
            let scratch = tempfile::tempdir().map_err(ErrorKind::Io)?;
            let mut cursor = unrar::Archive::new(&archive).open_for_processing().map_err(|err| {
                tracing::debug!(archive = %archive.display(), %err, "failed to open rar");
                ErrorKind::Archive(archive.clone())
            })?;
            let mut found = false;
            while let Some(before_file) = cursor.read_header().map_err(|err| {
                tracing::debug!(archive = %archive.display(), %err, "failed to read rar header");
                ErrorKind::Archive(archive.clone())
            })? {
                cursor = if before_file.entry().filename == entry {
                    found = true;
                    before_file.extract_with_base(scratch.path()).map_err(|err| {
                        tracing::debug!(archive = %archive.display(), %err, "failed to extract rar entry");
                        ErrorKind::Archive(archive.clone())
                    })?
                } else {
                    before_file.skip().map_err(|err| {
                        tracing::debug!(archive = %archive.display(), %err, "failed to skip rar entry");
                        ErrorKind::Archive(archive.clone())
                    })?
                };
            }
            if !found {
                exn::bail!(ErrorKind::EntryMissing(entry.clone()));
            }
            prepare_destination(&destination).map_err(ErrorKind::Io)?;
            std::fs::copy(scratch.path().join(&entry), &destination).map_err(ErrorKind::Io)?;
            Ok(())
        })
        .await
        .map_err(|_| ErrorKind::Task)?
    }
}
