//! Storage volume detection.
//!
//! The indexer prefers candidate files that live on the same volume as
//! the output directory, because a same-volume match can be renamed into
//! place instead of copied. "Volume" here is whatever the OS calls one:
//! on unix it is the device id from `stat`, which distinguishes mount
//! points without parsing mount tables.

use std::path::Path;

/// Identify the storage volume a path lives on, walking up to the nearest
/// existing ancestor so not-yet-created output directories still resolve.
///
/// Returns `None` when nothing along the path exists, or on platforms
/// without a usable device-id notion; callers treat unknown volumes as a
/// preference tie rather than an error.
#[cfg(unix)]
pub fn volume_of(path: &Path) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    let mut probe = Some(path);
    while let Some(current) = probe {
        if let Ok(meta) = std::fs::metadata(current) {
            return Some(meta.dev());
        }
        probe = current.parent();
    }
    None
}

#[cfg(not(unix))]
pub fn volume_of(_path: &Path) -> Option<u64> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_existing_path_has_a_volume() {
        assert!(volume_of(Path::new("/")).is_some());
    }

    #[test]
    fn test_missing_path_resolves_via_ancestor() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("not/created/yet");
        assert_eq!(volume_of(&missing), volume_of(temp.path()));
    }

    #[test]
    fn test_entirely_bogus_root_is_none_or_root_volume() {
        // Even a nonsense absolute path eventually walks up to "/".
        let bogus = PathBuf::from("/definitely/not/a/real/path/anywhere");
        assert_eq!(volume_of(&bogus), volume_of(Path::new("/")));
    }
}
