//! Fixdat writing.
//!
//! The residual catalog itself is computed over in the dat crate; this
//! module owns the IO half: sanitize the filename for the platform,
//! create the output directory if it isn't there yet, serialise, write.
//! A failure here aborts the fixdat stage and nothing else.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use romsift_dat::{Dat, logiqx};
use romsift_storage::sanitize_path;
use std::path::{Path, PathBuf};

/// Serialise `dat` as Logiqx XML into `{output_dir}/{dat.filename()}`,
/// creating the directory recursively, and return the written path.
pub async fn write(dat: &Dat, output_dir: &Path) -> Result<PathBuf> {
    let filename = sanitize_path(&dat.filename(), std::path::MAIN_SEPARATOR);
    let path = output_dir.join(filename);
    tokio::fs::create_dir_all(output_dir).await.or_raise(|| ErrorKind::Fixdat)?;
    tokio::fs::write(&path, logiqx::to_xml(dat)).await.or_raise(|| ErrorKind::Fixdat)?;
    tracing::info!(path = %path.display(), games = dat.games.len(), "fixdat written");
    Ok(path)
}
