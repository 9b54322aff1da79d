//! Archive adapters.
//!
//! This module defines the capability contract the reconciliation core
//! consumes: list an archive's entries (with checksums when the container
//! stores or can cheaply derive them) and extract a single entry to a
//! destination path. One adapter per container format, behind a shared
//! trait so the core never learns which library does the digging.
//!
//! # Notes
//! - Listing may legitimately return empty (a valid but entry-less
//!   archive); it may also fail outright (`ErrorKind::Archive`) for
//!   corrupt input, and callers drop the file rather than abort.
//! - All adapters are stateless unit structs; handles are `'static`.
//! - The underlying libraries are synchronous, so every operation runs
//!   under [`tokio::task::spawn_blocking`].

mod rar;
mod sevenzip;
mod tar;
mod zip;

pub use self::rar::RarAdapter;
pub use self::sevenzip::SevenZipAdapter;
pub use self::tar::TarAdapter;
pub use self::zip::ZipAdapter;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// The container formats this tool can see inside.
///
/// Kinds form a total preference order for the indexer, cheaper and
/// better-behaved formats first: Zip < Tar < Rar < SevenZip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArchiveKind {
    Zip,
    Tar,
    Rar,
    SevenZip,
}

impl ArchiveKind {
    /// Recognise an archive by file extension. Compound tarball
    /// extensions (`.tar.gz`, `.tgz`) resolve to Tar.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") || name.ends_with(".tar") {
            return Some(Self::Tar);
        }
        match name.rsplit_once('.')?.1 {
            "zip" => Some(Self::Zip),
            "rar" => Some(Self::Rar),
            "7z" => Some(Self::SevenZip),
            _ => None,
        }
    }

    /// Indexer preference weight; un-archived files are 0 and unknown
    /// containers 99, both of which live at the call sites that can see
    /// them.
    pub fn priority(self) -> u8 {
        match self {
            Self::Zip => 1,
            Self::Tar => 2,
            Self::Rar => 3,
            Self::SevenZip => 4,
        }
    }

    /// The adapter implementing this kind's listing and extraction.
    pub fn adapter(self) -> &'static dyn Archive {
        match self {
            Self::Zip => &ZipAdapter,
            Self::Tar => &TarAdapter,
            Self::Rar => &RarAdapter,
            Self::SevenZip => &SevenZipAdapter,
        }
    }
}

/// Normalized listing record for a single archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Entry path within the archive.
    pub path: PathBuf,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Zero-padded 8-hex-digit CRC32, when the container stores one (or
    /// the adapter derived one during listing).
    pub crc32: Option<String>,
}

/// Unified interface over archive containers.
///
/// Implementations promise that after [`extract`](Self::extract) returns
/// `Ok`, the destination path contains exactly the entry's bytes.
#[async_trait]
pub trait Archive: Send + Sync {
    /// Which container format this adapter digs into.
    fn kind(&self) -> ArchiveKind;

    /// List the archive's file entries.
    ///
    /// With `crc32` set, adapters populate [`EntryMeta::crc32`] when the
    /// container makes that possible without a full extraction pass per
    /// entry. An empty result is valid (and, for one notorious format,
    /// retried, see [`SevenZipAdapter`]).
    async fn entries(&self, archive: &Path, crc32: bool) -> Result<Vec<EntryMeta>>;

    /// Extract a single entry to `destination`, creating parent
    /// directories as needed.
    async fn extract(&self, archive: &Path, entry: &Path, destination: &Path) -> Result<()>;
}

/// Zero-padded 8-hex-digit rendering shared by the adapters and
/// [`Fingerprints`](crate::Fingerprints).
pub(crate) fn crc32_hex(value: u32) -> String {
    format!("{value:08x}")
}

/// Ensure `destination`'s parent directory exists before a blocking write.
pub(crate) fn prepare_destination(destination: &Path) -> std::io::Result<()> {
    match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
