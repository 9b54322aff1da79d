//! Tar adapter, covering plain tarballs and the gzipped variants.
//!
//! Tar stores no checksums, so when the caller asks for CRC32s the
//! adapter streams each entry through a hasher during the listing walk.
//! The walk is sequential anyway, so the bytes are already going past.

use super::{Archive, ArchiveKind, EntryMeta, crc32_hex, prepare_destination};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};

pub struct TarAdapter;

fn open_reader(archive: &Path) -> std::io::Result<Box<dyn Read>> {
    let file = std::fs::File::open(archive)?;
    let name = archive.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_ascii_lowercase();
    Ok(match name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        true => Box::new(GzDecoder::new(file)),
        false => Box::new(file),
    })
}

#[async_trait]
impl Archive for TarAdapter {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Tar
    }

    async fn entries(&self, archive: &Path, crc32: bool) -> Result<Vec<EntryMeta>> {
        let archive = archive.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let reader = open_reader(&archive).map_err(ErrorKind::Io)?;
            let mut tar = tar::Archive::new(reader);
            let mut entries = Vec::new();
            let walk = tar.entries().map_err(|err| {
                tracing::debug!(archive = %archive.display(), %err, "failed to open tar");
                ErrorKind::Archive(archive.clone())
            })?;
            for entry in walk {
                let mut entry = entry.map_err(|err| {
                    tracing::debug!(archive = %archive.display(), %err, "failed to read tar entry");
                    ErrorKind::Archive(archive.clone())
                })?;
                if !entry.header().entry_type().is_file() {
                    continue;
                }
                let path = entry
                    .path()
                    .map_err(|_| ErrorKind::Archive(archive.clone()))?
                    .into_owned();
                let size = entry.header().size().map_err(ErrorKind::Io)?;
                let crc = match crc32 {
                    true => {
                        let mut hasher = crc32fast::Hasher::new();
                        let mut buffer = [0u8; 8192];
                        loop {
                            let read = entry.read(&mut buffer).map_err(ErrorKind::Io)?;
                            if read == 0 {
                                break;
                            }
                            hasher.update(&buffer[..read]);
                        }
                        Some(crc32_hex(hasher.finalize()))
                    },
                    false => None,
                };
                entries.push(EntryMeta { path, size, crc32: crc });
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
            let reader = open_reader(&archive).map_err(ErrorKind::Io)?;
            let mut tar = tar::Archive::new(reader);
            let walk = tar.entries().map_err(|err| {
                tracing::debug!(archive = %archive.display(), %err, "failed to open tar");
                ErrorKind::Archive(archive.clone())
            })?;
            for candidate in walk {
                let mut candidate = candidate.map_err(|_| ErrorKind::Archive(archive.clone()))?;
                let path = candidate
                    .path()
                    .map_err(|_| ErrorKind::Archive(archive.clone()))?
                    .into_owned();
                if path == entry {
                    prepare_destination(&destination).map_err(ErrorKind::Io)?;
                    let mut out = std::fs::File::create(&destination).map_err(ErrorKind::Io)?;
                    std::io::copy(&mut candidate, &mut out).map_err(ErrorKind::Io)?;
                    return Ok(());
                }
            }
            exn::bail!(ErrorKind::EntryMissing(entry.clone()));
        })
        .await
        .map_err(|_| ErrorKind::Task)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_tar(dir: &Path) -> PathBuf {
        let path = dir.join("fixture.tar");
        let file = std::fs::File::create(&path).unwrap();
        let mut builder = tar::Builder::new(file);
        let mut header = tar::Header::new_gnu();
        header.set_size(4);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "inner/a.rom", &b"aaaa"[..]).unwrap();
        let mut header = tar::Header::new_gnu();
        header.set_size(6);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "b.rom", &b"bbbbbb"[..]).unwrap();
        builder.finish().unwrap();
        path
    }

    #[tokio::test]
    async fn test_entries_derive_crcs_while_walking() {
        let temp = tempfile::tempdir().unwrap();
        let archive = build_tar(temp.path());
        let entries = TarAdapter.entries(&archive, true).await.unwrap();
        assert_eq!(entries.len(), 2);
        let a = entries.iter().find(|e| e.path == PathBuf::from("inner/a.rom")).unwrap();
        assert_eq!(a.size, 4);
        assert_eq!(a.crc32.as_deref(), Some(&crc32_hex(crc32fast::hash(b"aaaa"))[..]));
    }

    #[tokio::test]
    async fn test_extract_entry() {
        let temp = tempfile::tempdir().unwrap();
        let archive = build_tar(temp.path());
        let destination = temp.path().join("out/b.rom");
        TarAdapter.extract(&archive, Path::new("b.rom"), &destination).await.unwrap();
        assert_eq!(std::fs::read(&destination).unwrap(), b"bbbbbb");
    }

    #[tokio::test]
    async fn test_extract_missing_entry() {
        let temp = tempfile::tempdir().unwrap();
        let archive = build_tar(temp.path());
        let err = TarAdapter
            .extract(&archive, Path::new("ghost.rom"), &temp.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_error(), ErrorKind::EntryMissing(_)));
    }
}
