//! The reconciliation pipeline.
//!
//! Stages run in order (merge, scan, index, match, fixdat) with
//! element-wise work inside each stage running concurrently and the
//! stage boundaries acting as barriers. [`reconcile`] wires the whole
//! thing together; the individual stages are public for callers that
//! want to drive them separately (or watch the streams go by).

pub mod candidates;
pub mod error;
pub mod fixdat;
pub mod index;
mod options;
mod prefer;
pub mod scan;

pub use crate::candidates::{CandidateSet, ReleaseCandidate, RomBinding};
pub use crate::index::{FileIndex, IndexContext, IndexedFile, Viewpoint};
pub use crate::options::Options;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use romsift_dat::fixdat::Provenance;
use romsift_dat::{Dat, merge};
use std::path::PathBuf;

/// What a reconcile pass accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Games in the (original) catalog.
    pub games: usize,
    /// Complete release candidates assembled.
    pub candidates: usize,
    /// Games with at least one ROM unaccounted for.
    pub missing: usize,
    /// Where the fixdat landed, when one was requested and needed.
    pub fixdat: Option<PathBuf>,
}

/// Run the full pipeline for one catalog.
///
/// The merge transform is applied first and candidates are assembled
/// against the *transformed* catalog; the fixdat diffs the *original*
/// catalog against what was actually found, which is what a user
/// re-sourcing missing files wants to read.
///
/// # Errors
/// Input directories must exist ([`ErrorKind::Walk`]); a fixdat write
/// failure aborts the fixdat stage ([`ErrorKind::Fixdat`]). Per-file
/// problems never fail the pass; they are logged and the file dropped.
pub async fn reconcile(dat: &Dat, options: &Options) -> Result<Report> {
    for dir in &options.input_dirs {
        tokio::fs::metadata(dir).await.or_raise(|| ErrorKind::Walk)?;
    }

    let transformed = merge::apply(dat, options.merge_mode);
    tracing::info!(
        name = %transformed.header.name,
        games = transformed.games.len(),
        mode = options.merge_mode.map(|m| m.to_string()).unwrap_or_else(|| "off".to_string()),
        "catalog transformed"
    );

    let ctx = IndexContext::new(&options.output_dir);
    let index = index::build(scan::scan(&options.input_dirs), &ctx).await;

    let sets = candidates::assemble(&transformed, &index);
    let found: usize = sets.iter().map(|set| set.candidates.len()).sum();
    let written = candidates::written_hashes(&sets);
    let missing = dat
        .games
        .iter()
        .filter(|game| !game.roms.iter().all(|rom| written.contains(&rom.crc)))
        .count();

    let fixdat_path = match options.fixdat {
        true => {
            let provenance = Provenance {
                tool: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                inputs: options.input_dirs.iter().map(|p| p.display().to_string()).collect(),
                output: options.output_dir.display().to_string(),
            };
            match romsift_dat::fixdat::residual(dat, &written, &provenance) {
                Some(residual) => Some(fixdat::write(&residual, &options.output_dir).await?),
                None => None,
            }
        },
        false => None,
    };

    tracing::info!(candidates = found, missing, "reconcile complete");
    Ok(Report { games: dat.games.len(), candidates: found, missing, fixdat: fixdat_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use romsift_dat::{DatHeader, Game, MergeMode, Rom};

    fn crc(bytes: &[u8]) -> String {
        format!("{:08x}", crc32fast::hash(bytes))
    }

    fn world() -> (tempfile::TempDir, Dat) {
        let temp = tempfile::tempdir().unwrap();
        let input = temp.path().join("input");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("alpha.rom"), b"alpha bytes").unwrap();
        std::fs::write(input.join("beta.rom"), b"beta bytes").unwrap();
        let dat = Dat::new(
            DatHeader::new("suite").with_description("two games"),
            [
                Game::new("present").with_roms([
                    Rom::new("alpha.rom", 11, crc(b"alpha bytes")),
                    Rom::new("beta.rom", 10, crc(b"beta bytes")),
                ]),
                Game::new("absent").with_roms([Rom::new("gamma.rom", 9, "eeeeeeee")]),
            ],
        );
        (temp, dat)
    }

    #[tokio::test]
    async fn test_reconcile_reports_and_writes_fixdat() {
        let (temp, dat) = world();
        let options = Options::new(temp.path().join("output"))
            .with_inputs([temp.path().join("input")])
            .with_merge_mode(MergeMode::None)
            .with_fixdat(true);
        let report = reconcile(&dat, &options).await.unwrap();
        assert_eq!(report.games, 2);
        assert_eq!(report.candidates, 1);
        assert_eq!(report.missing, 1);
        let fixdat_path = report.fixdat.unwrap();
        let xml = std::fs::read_to_string(&fixdat_path).unwrap();
        assert!(xml.contains("<name>suite fixdat</name>"));
        assert!(xml.contains("<game name=\"absent\">"));
        assert!(!xml.contains("<game name=\"present\">"));
    }

    #[tokio::test]
    async fn test_reconcile_complete_collection_skips_fixdat() {
        let (temp, mut dat) = world();
        dat.games.retain(|game| game.name == "present");
        let options = Options::new(temp.path().join("output"))
            .with_inputs([temp.path().join("input")])
            .with_fixdat(true);
        let report = reconcile(&dat, &options).await.unwrap();
        assert_eq!(report.missing, 0);
        assert!(report.fixdat.is_none());
        assert!(!temp.path().join("output").exists());
    }

    #[tokio::test]
    async fn test_reconcile_missing_input_dir_fails_early() {
        let (temp, dat) = world();
        let options =
            Options::new(temp.path().join("output")).with_inputs([temp.path().join("nonexistent")]);
        let err = reconcile(&dat, &options).await.unwrap_err();
        assert!(matches!(err.as_error(), ErrorKind::Walk));
    }
}
