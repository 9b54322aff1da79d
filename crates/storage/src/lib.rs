pub mod archive;
pub mod error;
mod file;
mod header;
mod mounts;
pub mod path;

pub use crate::archive::{Archive, ArchiveKind, EntryMeta};
pub use crate::file::{Fingerprints, RomFile};
pub use crate::header::RomHeader;
pub use crate::mounts::volume_of;
pub use crate::path::sanitize as sanitize_path;
use std::sync::Arc;

/// Shared handle to an immutable candidate file. Fingerprints memoise
/// behind the shared allocation, so cloning a handle never recomputes.
pub type FileHandle = Arc<RomFile>;
