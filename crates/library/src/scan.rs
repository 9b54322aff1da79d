//! Filesystem scanning: turn input directories into candidate handles.
//!
//! Walks each input root, expanding recognised archives into per-entry
//! handles through their adapter (listing checksums seeded so indexing
//! rarely needs to extract anything). A malformed archive is warned
//! about and dropped (the pipeline keeps going), as is a file that
//! vanishes between the walk and the stat.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use romsift_storage::{ArchiveKind, FileHandle, RomFile};
use std::path::PathBuf;
use std::sync::Arc;
use walkdir::WalkDir;

/// Stream candidate handles from the input roots, depth-first in
/// file-name order so downstream output is reproducible run-to-run.
///
/// Item errors are reserved for walk-level failures (unreadable
/// directories); per-file problems are logged and skipped per the
/// propagation policy.
pub fn scan(inputs: &[PathBuf]) -> impl Stream<Item = Result<FileHandle>> {
    let inputs = inputs.to_vec();
    stream! {
        for root in &inputs {
            let walk = WalkDir::new(root).follow_links(false).sort_by_file_name();
            for entry in walk {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        yield Err(err).or_raise(|| ErrorKind::Walk);
                        continue;
                    },
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.into_path();
                match ArchiveKind::from_path(&path) {
                    Some(kind) => {
                        match kind.adapter().entries(&path, true).await {
                            Ok(entries) => {
                                for meta in entries {
                                    yield Ok(Arc::new(RomFile::archive_entry(
                                        &path, kind, meta.path, meta.size, meta.crc32,
                                    )));
                                }
                            },
                            Err(err) => {
                                tracing::warn!(archive = %path.display(), %err, "malformed archive dropped from scan");
                            },
                        }
                    },
                    None => match RomFile::from_path(&path).await {
                        Ok(file) => yield Ok(Arc::new(file)),
                        Err(err) => {
                            tracing::warn!(file = %path.display(), %err, "unreadable file dropped from scan");
                        },
                    },
                }
            }
        }
    }
}
