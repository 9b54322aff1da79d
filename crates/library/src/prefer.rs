//! The indexer's strict preference relation.
//!
//! When several candidate files share a fingerprint, exactly one ordering
//! decides who sits at the head of the bucket. Compare step by step and
//! let the first difference decide; the final path comparison makes the
//! relation total, so the output is a pure function of (file attributes,
//! output directory, volume map) and nothing else.

use crate::index::{IndexContext, IndexedFile, Viewpoint};
use std::cmp::Ordering;

pub(crate) fn compare(a: &IndexedFile, b: &IndexedFile, ctx: &IndexContext) -> Ordering {
    header_cost(a)
        .cmp(&header_cost(b))
        .then_with(|| archive_cost(a).cmp(&archive_cost(b)))
        .then_with(|| output_cost(a, ctx).cmp(&output_cost(b, ctx)))
        .then_with(|| volume_cost(a, ctx).cmp(&volume_cost(b, ctx)))
        .then_with(|| a.file.path().cmp(b.file.path()))
        .then_with(|| a.file.entry_path().cmp(&b.file.entry_path()))
}

/// Step 1: a file matched through its natural bytes beats one matched
/// through its header-stripped viewpoint.
fn header_cost(file: &IndexedFile) -> u8 {
    match file.viewpoint {
        Viewpoint::Raw => 0,
        Viewpoint::Stripped => 1,
    }
}

/// Step 2: un-archived beats archived; archive kinds carry their own
/// total order. (The "unknown container = 99" slot from the contract is
/// unrepresentable here, unknown containers never make it past the
/// scanner, but the weights leave room for it.)
fn archive_cost(file: &IndexedFile) -> u8 {
    file.file.archive_kind().map(|kind| kind.priority()).unwrap_or(0)
}

/// Step 3: a file already sitting inside the output directory loses to
/// one outside it, so a suspect output never overwrites itself.
fn output_cost(file: &IndexedFile, ctx: &IndexContext) -> u8 {
    u8::from(file.file.path().starts_with(ctx.output_dir()))
}

/// Step 4: same storage volume as the output wins; downstream gets a
/// rename instead of a copy. Unknown volumes are a tie, not a penalty.
fn volume_cost(file: &IndexedFile, ctx: &IndexContext) -> u8 {
    match (ctx.output_volume(), file.volume) {
        (Some(output), Some(candidate)) => u8::from(output != candidate),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use romsift_storage::{ArchiveKind, RomFile};
    use std::path::Path;
    use std::sync::Arc;

    fn archived(path: &str, kind: ArchiveKind, entry: &str) -> IndexedFile {
        IndexedFile {
            file: Arc::new(RomFile::archive_entry(path, kind, entry, 4, Some("aabbccdd".into()))),
            viewpoint: Viewpoint::Raw,
            effective_size: 4,
            volume: None,
        }
    }

    async fn plain(dir: &Path, name: &str) -> IndexedFile {
        let path = dir.join(name);
        std::fs::write(&path, b"data").unwrap();
        IndexedFile {
            file: Arc::new(RomFile::from_path(&path).await.unwrap()),
            viewpoint: Viewpoint::Raw,
            effective_size: 4,
            volume: None,
        }
    }

    #[tokio::test]
    async fn test_unarchived_beats_zip() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = IndexContext::new(temp.path().join("out"));
        let raw = plain(temp.path(), "a.rom").await;
        let zipped = archived(&temp.path().join("b.zip").to_string_lossy(), ArchiveKind::Zip, "a.rom");
        assert_eq!(compare(&raw, &zipped, &ctx), Ordering::Less);
        assert_eq!(compare(&zipped, &raw, &ctx), Ordering::Greater);
    }

    #[tokio::test]
    async fn test_archive_kind_order() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = IndexContext::new(temp.path().join("out"));
        let zipped = archived("/in/a.zip", ArchiveKind::Zip, "x");
        let tarred = archived("/in/a.tar", ArchiveKind::Tar, "x");
        let rarred = archived("/in/a.rar", ArchiveKind::Rar, "x");
        let sevens = archived("/in/a.7z", ArchiveKind::SevenZip, "x");
        assert_eq!(compare(&zipped, &tarred, &ctx), Ordering::Less);
        assert_eq!(compare(&tarred, &rarred, &ctx), Ordering::Less);
        assert_eq!(compare(&rarred, &sevens, &ctx), Ordering::Less);
    }

    #[tokio::test]
    async fn test_raw_viewpoint_beats_stripped() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = IndexContext::new(temp.path().join("out"));
        let mut stripped = archived("/in/a.zip", ArchiveKind::Zip, "x");
        stripped.viewpoint = Viewpoint::Stripped;
        // Even a worse archive kind wins over a stripped match.
        let sevens = archived("/in/b.7z", ArchiveKind::SevenZip, "x");
        assert_eq!(compare(&sevens, &stripped, &ctx), Ordering::Less);
    }

    #[tokio::test]
    async fn test_output_directory_deprioritised() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let ctx = IndexContext::new(&out);
        let inside = plain(&out, "a.rom").await;
        let outside = plain(temp.path(), "z.rom").await;
        // "z.rom" would lose the path tiebreak; the output-dir rule must
        // decide first.
        assert_eq!(compare(&outside, &inside, &ctx), Ordering::Less);
    }

    #[tokio::test]
    async fn test_same_volume_preferred_with_injected_volumes() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = IndexContext::new(temp.path().join("out")).with_volume(Some(7));
        let mut near = archived("/in/b.zip", ArchiveKind::Zip, "x");
        near.volume = Some(7);
        let mut far = archived("/in/a.zip", ArchiveKind::Zip, "x");
        far.volume = Some(9);
        // "a.zip" would win the path tiebreak; the volume rule decides first.
        assert_eq!(compare(&near, &far, &ctx), Ordering::Less);
    }

    #[tokio::test]
    async fn test_unknown_volume_is_a_tie_broken_by_path() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = IndexContext::new(temp.path().join("out")).with_volume(Some(7));
        let near = archived("/in/b.zip", ArchiveKind::Zip, "x");
        let far = archived("/in/a.zip", ArchiveKind::Zip, "x");
        assert_eq!(compare(&far, &near, &ctx), Ordering::Less);
    }

    #[tokio::test]
    async fn test_entry_path_is_final_tiebreak() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = IndexContext::new(temp.path().join("out"));
        let first = archived("/in/a.zip", ArchiveKind::Zip, "aaa.rom");
        let second = archived("/in/a.zip", ArchiveKind::Zip, "bbb.rom");
        assert_eq!(compare(&first, &second, &ctx), Ordering::Less);
    }
}
