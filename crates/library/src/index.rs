//! The file indexer: fingerprint → preference-ordered candidates.
//!
//! Consumes the scanner's stream of handles, fingerprints them
//! concurrently (bounded), and builds a multimap from checksum to the
//! files carrying it. A file with a detected ROM-format header indexes
//! under both of its viewpoints, so a catalog that checksums headerless
//! cartridge data still finds the headered dump on disk.
//!
//! Discovery and fingerprinting overlap: up to [`MAX_PROCESS_CONCURRENCY`]
//! files hash at once while the scanner keeps walking, with the overflow
//! parked until a slot frees up. The map itself is single-writer during
//! build-up and frozen (sorted) before anyone gets to query it.

use crate::prefer;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use romsift_storage::error::Result as StorageResult;
use romsift_storage::{FileHandle, Fingerprints, volume_of};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::pin;

const MAX_PROCESS_CONCURRENCY: usize = 100;

/// Which of a file's two fingerprints matched the index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewpoint {
    /// The file's natural bytes.
    Raw,
    /// The bytes after a detected ROM-format header.
    Stripped,
}

/// One occupant of an index bucket: a file handle plus which viewpoint
/// put it there.
#[derive(Debug, Clone)]
pub struct IndexedFile {
    pub file: FileHandle,
    pub viewpoint: Viewpoint,
    /// The byte count the matched viewpoint actually covers: the file
    /// size, less the header for stripped matches. This is what a
    /// catalog ROM's declared size must agree with.
    pub effective_size: u64,
    /// Storage volume the file lives on, captured at insertion so the
    /// preference sort never touches the filesystem.
    pub(crate) volume: Option<u64>,
}

/// Everything the preference relation needs to know about the world
/// outside the files themselves.
#[derive(Debug, Clone)]
pub struct IndexContext {
    output_dir: PathBuf,
    output_volume: Option<u64>,
}

impl IndexContext {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let output_volume = volume_of(&output_dir);
        Self { output_dir, output_volume }
    }

    /// Override the detected output volume; the ordering is specified as
    /// a pure function of the volume map, so tests inject one.
    pub fn with_volume(mut self, volume: Option<u64>) -> Self {
        self.output_volume = volume;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_volume(&self) -> Option<u64> {
        self.output_volume
    }
}

/// Fingerprint → candidates, each bucket sorted by the preference
/// relation (best first).
#[derive(Debug, Default)]
pub struct FileIndex {
    map: HashMap<String, Vec<IndexedFile>>,
}

impl FileIndex {
    /// All candidates for a fingerprint, best first. Empty when nothing
    /// on disk carries those bytes.
    pub fn find(&self, crc: &str) -> &[IndexedFile] {
        self.map.get(crc).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of distinct fingerprints indexed.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn insert(&mut self, key: String, entry: IndexedFile) {
        self.map.entry(key).or_default().push(entry);
    }

    fn freeze(&mut self, ctx: &IndexContext) {
        for bucket in self.map.values_mut() {
            bucket.sort_by(|a, b| prefer::compare(a, b, ctx));
        }
    }
}

/// Build the index from a stream of candidate handles.
///
/// Never fails: an unreadable or unfingerprintable file is logged and
/// dropped, and an empty input stream yields an empty index. Dropping
/// the returned future mid-build discards the partial index.
pub async fn build<S>(files: S, ctx: &IndexContext) -> FileIndex
where
    S: Stream<Item = crate::error::Result<FileHandle>>,
{
    let mut files = pin!(files);
    let mut index = FileIndex::default();
    let mut discovery_complete = false;
    let mut discovered = 0u64;
    let mut not_processing_yet = Vec::new();
    let mut processing = FuturesUnordered::new();
    loop {
        tokio::select! {
            biased;

            file = files.next(), if !discovery_complete => match file {
                Some(Ok(file)) => {
                    discovered += 1;
                    let future = fingerprint_one(file);
                    if processing.len() < MAX_PROCESS_CONCURRENCY {
                        processing.push(future);
                    } else {
                        not_processing_yet.push(future);
                    }
                },
                Some(Err(err)) => {
                    tracing::warn!(%err, "candidate source error; entry dropped from index");
                },
                None => {
                    discovery_complete = true;
                    tracing::debug!(discovered, "candidate discovery complete");
                },
            },

            Some((file, result)) = processing.next(), if !processing.is_empty() => {
                match result {
                    Ok(prints) => insert_file(&mut index, file, &prints),
                    Err(err) => {
                        tracing::warn!(path = %file.path().display(), %err, "failed to fingerprint; dropped from index");
                    },
                }
                if let Some(future) = not_processing_yet.pop() {
                    processing.push(future);
                }
            },

            else => {
                if !not_processing_yet.is_empty() {
                    let batch = MAX_PROCESS_CONCURRENCY.min(not_processing_yet.len());
                    processing.extend(not_processing_yet.drain(..batch));
                } else {
                    break;
                }
            },
        }
    }
    index.freeze(ctx);
    tracing::info!(files = discovered, fingerprints = index.len(), "index frozen");
    index
}

async fn fingerprint_one(file: FileHandle) -> (FileHandle, StorageResult<Fingerprints>) {
    let result = file.fingerprints().await.map(Clone::clone);
    (file, result)
}

fn insert_file(index: &mut FileIndex, file: FileHandle, prints: &Fingerprints) {
    let volume = volume_of(file.path());
    index.insert(
        prints.raw.clone(),
        IndexedFile {
            file: file.clone(),
            viewpoint: Viewpoint::Raw,
            effective_size: file.size(),
            volume,
        },
    );
    if let Some(stripped) = &prints.stripped {
        let header_len = prints.header.map(|h| h.len).unwrap_or(0);
        let effective_size = file.size().saturating_sub(header_len);
        index.insert(
            stripped.clone(),
            IndexedFile { file, viewpoint: Viewpoint::Stripped, effective_size, volume },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan;
    use std::io::Write;
    use std::path::PathBuf;

    fn crc(bytes: &[u8]) -> String {
        format!("{:08x}", crc32fast::hash(bytes))
    }

    async fn build_from(dir: &Path, ctx: &IndexContext) -> FileIndex {
        build(scan(&[dir.to_path_buf()]), ctx).await
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_index() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = IndexContext::new(temp.path().join("out"));
        let index = build_from(temp.path(), &ctx).await;
        assert!(index.is_empty());
        assert!(index.find("00000000").is_empty());
    }

    #[tokio::test]
    async fn test_raw_file_sorts_before_zipped_duplicate() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("a.rom"), b"same bytes").unwrap();
        let archive = temp.path().join("b.zip");
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&archive).unwrap());
        writer.start_file("a.rom", zip::write::SimpleFileOptions::default()).unwrap();
        writer.write_all(b"same bytes").unwrap();
        writer.finish().unwrap();

        let ctx = IndexContext::new(temp.path().join("out"));
        let index = build_from(temp.path(), &ctx).await;
        let bucket = index.find(&crc(b"same bytes"));
        assert_eq!(bucket.len(), 2);
        assert!(!bucket[0].file.is_archived());
        assert!(bucket[1].file.is_archived());
    }

    #[tokio::test]
    async fn test_headered_file_indexes_under_both_viewpoints() {
        let temp = tempfile::tempdir().unwrap();
        let mut bytes = vec![0u8; 16];
        bytes[..4].copy_from_slice(b"NES\x1a");
        bytes.extend_from_slice(b"CARTRIDGE DATA");
        std::fs::write(temp.path().join("game.nes"), &bytes).unwrap();

        let ctx = IndexContext::new(temp.path().join("out"));
        let index = build_from(temp.path(), &ctx).await;
        let raw = index.find(&crc(&bytes));
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].viewpoint, Viewpoint::Raw);
        assert_eq!(raw[0].effective_size, bytes.len() as u64);
        let stripped = index.find(&crc(b"CARTRIDGE DATA"));
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped[0].viewpoint, Viewpoint::Stripped);
        assert_eq!(stripped[0].effective_size, 14);
    }

    #[tokio::test]
    async fn test_determinism_across_builds() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["c.rom", "a.rom", "b.rom"] {
            std::fs::write(temp.path().join(name), b"identical").unwrap();
        }
        let ctx = IndexContext::new(temp.path().join("out"));
        let key = crc(b"identical");
        let first: Vec<PathBuf> = build_from(temp.path(), &ctx)
            .await
            .find(&key)
            .iter()
            .map(|f| f.file.path().to_path_buf())
            .collect();
        let second: Vec<PathBuf> = build_from(temp.path(), &ctx)
            .await
            .find(&key)
            .iter()
            .map(|f| f.file.path().to_path_buf())
            .collect();
        assert_eq!(first, second);
        // Lexicographic tiebreak.
        assert!(first.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn test_output_directory_occupant_loses() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        // "a.rom" in the output dir would win the lexicographic tiebreak.
        std::fs::write(out.join("a.rom"), b"payload").unwrap();
        std::fs::write(temp.path().join("z.rom"), b"payload").unwrap();

        let ctx = IndexContext::new(&out);
        let index = build_from(temp.path(), &ctx).await;
        let bucket = index.find(&crc(b"payload"));
        assert_eq!(bucket.len(), 2);
        assert!(bucket[0].file.path().ends_with("z.rom"));
    }
}
