//! Candidate assembly: match the transformed catalog against the index.
//!
//! A game becomes a release candidate only when every one of its ROMs
//! resolves to an indexed file; partial sets stay missing and surface in
//! the fixdat instead. Each ROM binds to the head of its preference-
//! ordered bucket, so "which copy do we use" is already decided by the
//! time anything downstream looks.

use crate::index::{FileIndex, IndexedFile};
use romsift_dat::{Dat, Game, Rom};
use std::collections::HashSet;

/// One catalog ROM bound to the file that will provide its bytes.
#[derive(Debug, Clone)]
pub struct RomBinding {
    pub rom: Rom,
    pub file: IndexedFile,
}

/// A game every ROM of which was found on disk.
#[derive(Debug, Clone)]
pub struct ReleaseCandidate {
    pub game: Game,
    pub bindings: Vec<RomBinding>,
}

/// The candidates of one parent class, keyed by the class name.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    pub parent: String,
    pub candidates: Vec<ReleaseCandidate>,
}

/// Assemble candidates per parent class, preserving class order.
pub fn assemble(dat: &Dat, index: &FileIndex) -> Vec<CandidateSet> {
    dat.parents()
        .into_iter()
        .map(|set| CandidateSet {
            parent: set.name().to_string(),
            candidates: set.games().filter_map(|game| candidate_for(game, index)).collect(),
        })
        .collect()
}

fn candidate_for(game: &Game, index: &FileIndex) -> Option<ReleaseCandidate> {
    let mut bindings = Vec::with_capacity(game.roms.len());
    for rom in &game.roms {
        let file = index
            .find(&rom.crc)
            .iter()
            // The bucket is preference-ordered; take the best copy whose
            // matched viewpoint covers the declared size. Size-less
            // catalog entries match on fingerprint alone.
            .find(|file| rom.size == 0 || file.effective_size == rom.size)?;
        bindings.push(RomBinding { rom: rom.clone(), file: file.clone() });
    }
    Some(ReleaseCandidate { game: game.clone(), bindings })
}

/// The union of fingerprints across every candidate's bindings, the
/// "what actually made it" set the fixdat generator diffs against.
pub fn written_hashes(sets: &[CandidateSet]) -> HashSet<String> {
    sets.iter()
        .flat_map(|set| &set.candidates)
        .flat_map(|candidate| &candidate.bindings)
        .map(|binding| binding.rom.crc.clone())
        .collect()
}
