//! SevenZip adapter.
//!
//! The 7z library misbehaves under concurrent listing (it has been
//! observed returning empty entry sets when multiple archives are walked
//! at once), so every listing in the process serialises on one mutex.
//! Even under the mutex, spurious empties still happen, so a zero-entry
//! listing is retried a few times with jittered exponential backoff
//! before being believed. Both the bound and the envelope are empirical;
//! leave them alone unless benchmarks say otherwise.

use super::{Archive, ArchiveKind, EntryMeta, crc32_hex, prepare_destination};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Process-wide listing serialisation (see module docs).
static LISTING_LOCK: Mutex<()> = Mutex::new(());

const LIST_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(100);

pub struct SevenZipAdapter;

/// Re-run a listing operation while it keeps coming back empty, up to
/// [`LIST_ATTEMPTS`] total attempts, sleeping `100ms · 2ⁿ` plus up to
/// half a step of uniform jitter between attempts. A hard error is never
/// retried; only the suspicious empty result is.
pub(crate) async fn retry_empty_listing<T, F, Fut>(mut list: F) -> Result<Vec<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut attempt = 0;
    loop {
        let entries = list().await?;
        attempt += 1;
        if !entries.is_empty() || attempt >= LIST_ATTEMPTS {
            return Ok(entries);
        }
        let step = BACKOFF_BASE * 2u32.pow(attempt - 1);
        let jitter =
            Duration::from_millis(rand::thread_rng().gen_range(0..=step.as_millis() as u64 / 2));
        tracing::debug!(attempt, backoff = ?(step + jitter), "7z listing came back empty; retrying");
        tokio::time::sleep(step + jitter).await;
    }
}

fn list_blocking(archive: &Path, crc32: bool) -> Result<Vec<EntryMeta>> {
    // Lock inside the blocking section so the guard is never held across
    // an await point.
    let _guard = LISTING_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let reader =
        sevenz_rust::SevenZReader::open(archive, sevenz_rust::Password::empty()).map_err(|err| {
            tracing::debug!(archive = %archive.display(), %err, "failed to open 7z");
            ErrorKind::Archive(archive.to_path_buf())
        })?;
    let mut entries = Vec::new();
    for entry in &reader.archive().files {
        if entry.is_directory() {
            continue;
        }
        entries.push(EntryMeta {
            path: PathBuf::from(entry.name()),
            size: entry.size(),
            crc32: (crc32 && entry.has_crc).then(|| crc32_hex(entry.crc as u32)),
        });
    }
    Ok(entries)
}

#[async_trait]
impl Archive for SevenZipAdapter {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::SevenZip
    }

    async fn entries(&self, archive: &Path, crc32: bool) -> Result<Vec<EntryMeta>> {
        let archive = archive.to_path_buf();
        retry_empty_listing(move || {
            let archive = archive.clone();
            async move {
                tokio::task::spawn_blocking(move || list_blocking(&archive, crc32))
                    .await
                    .map_err(|_| ErrorKind::Task)?
            }
        })
        .await
    }

    async fn extract(&self, archive: &Path, entry: &Path, destination: &Path) -> Result<()> {
        let archive = archive.to_path_buf();
        let entry = entry.to_path_buf();
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || {
            // The library's solid-block decoder wants to walk the whole
            // archive anyway; unpack into a per-extraction scratch
            // directory and move the requested entry into place. The
            // scratch is released on every exit path.
            let scratch = tempfile::tempdir().map_err(ErrorKind::Io)?;
            sevenz_rust::decompress_file(&archive, scratch.path()).map_err(|err| {
                tracing::debug!(archive = %archive.display(), %err, "failed to unpack 7z");
                ErrorKind::Archive(archive.clone())
            })?;
            let unpacked = scratch.path().join(&entry);
            if !unpacked.is_file() {
                exn::bail!(ErrorKind::EntryMissing(entry.clone()));
            }
            prepare_destination(&destination).map_err(ErrorKind::Io)?;
            std::fs::copy(&unpacked, &destination).map_err(ErrorKind::Io)?;
            Ok(())
        })
        .await
        .map_err(|_| ErrorKind::Task)?
    }
}
