//! Residual catalog computation.
//!
//! Diffs a catalog against the set of fingerprints that made it into the
//! output and produces a synthetic sub-catalog of everything still
//! incomplete. Writing the result to disk is the library crate's job;
//! this module only does the arithmetic and the derived header.

use crate::models::{Dat, DatHeader, Game};
use std::collections::HashSet;
use time::UtcDateTime;

/// Where a fixdat came from, recorded in its header comment so a catalog
/// found on disk months later explains itself.
#[derive(Debug, Clone)]
pub struct Provenance {
    /// Tool name, e.g. `romsift`.
    pub tool: String,
    /// Tool version.
    pub version: String,
    /// Input paths that were scanned.
    pub inputs: Vec<String>,
    /// Output directory the reconciled sets were written to.
    pub output: String,
}

impl Provenance {
    fn comment_lines(&self, original: &Dat) -> Vec<String> {
        let mut lines = vec![
            format!("generated by {} v{}", self.tool, self.version),
            format!("original dat: {}", original.header.name),
        ];
        lines.extend(self.inputs.iter().map(|input| format!("input: {input}")));
        lines.push(format!("output: {}", self.output));
        lines
    }
}

/// Compute the residual catalog: every game at least one of whose ROMs is
/// absent from `written`.
///
/// Returns `None` when nothing is missing; the caller emits no fixdat at
/// all in that case, rather than an empty catalog. Games without any ROMs
/// are vacuously complete.
pub fn residual(original: &Dat, written: &HashSet<String>, provenance: &Provenance) -> Option<Dat> {
    let missing: Vec<Game> = original
        .games
        .iter()
        .filter(|game| !game.roms.iter().all(|rom| written.contains(&rom.crc)))
        .cloned()
        .collect();
    if missing.is_empty() {
        return None;
    }
    tracing::debug!(missing = missing.len(), total = original.games.len(), "building fixdat");
    Some(Dat { header: derive_header(original, provenance, UtcDateTime::now()), games: missing })
}

/// Derived header: name and description suffixed `" fixdat"`, version and
/// date stamped with the generation instant (UTC), comment carrying
/// provenance.
fn derive_header(original: &Dat, provenance: &Provenance, now: UtcDateTime) -> DatHeader {
    let stamp = timestamp(now);
    DatHeader {
        name: format!("{} fixdat", original.header.name),
        description: format!("{} fixdat", original.header.description),
        version: stamp.clone(),
        date: stamp,
        url: original.header.url.clone(),
        comment: provenance.comment_lines(original),
        nested_rom_names: false,
    }
}

/// `YYYYMMDD-HHmmss`, zero-padded, UTC.
fn timestamp(now: UtcDateTime) -> String {
    format!(
        "{:04}{:02}{:02}-{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
