//! ROM-set arithmetic over the parent/clone graph.
//!
//! [`apply`] reshapes a catalog between the four canonical merge modes.
//! The transform is pure: it works per parent class, never mutates its
//! input, and absorbs dangling references (a clone of a missing parent, a
//! device nobody declared) with a debug line rather than an error.
//!
//! Per-class pipeline:
//!
//! ```text
//! raw → sanitized → [FullNonMerged: +device ROMs]
//!                 → [non-full:      −BIOS ROMs]
//!                 → [Split|Merged:  −parent ROMs]
//!                 → assembled(mode)
//! ```

use crate::models::{Dat, Game, ParentSet, Rom};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// Policy for distributing shared ROMs between parent and clone sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Sanitize only; no set arithmetic beyond BIOS subtraction.
    None,
    /// Clones carry only their deltas from the parent.
    Split,
    /// Each class collapses to one game with clone-prefixed ROM names.
    Merged,
    /// Every game is self-contained; device ROMs are inlined.
    FullNonMerged,
}

impl MergeMode {
    fn is_full(self) -> bool {
        matches!(self, Self::FullNonMerged)
    }

    fn subtracts_parent(self) -> bool {
        matches!(self, Self::Split | Self::Merged)
    }
}

impl std::fmt::Display for MergeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Split => "split",
            Self::Merged => "merged",
            Self::FullNonMerged => "fullnonmerged",
        })
    }
}

impl FromStr for MergeMode {
    type Err = UnknownMergeMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "split" => Ok(Self::Split),
            "merged" => Ok(Self::Merged),
            "fullnonmerged" => Ok(Self::FullNonMerged),
            _ => Err(UnknownMergeMode(value.to_string())),
        }
    }
}

/// The configuration surface named a merge mode this crate doesn't know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMergeMode(pub String);

impl std::fmt::Display for UnknownMergeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognised merge mode: {:?}", self.0)
    }
}

impl std::error::Error for UnknownMergeMode {}

/// Reshape a catalog according to a merge mode.
///
/// With no mode, or a catalog carrying no parent/clone metadata at all,
/// the input comes back unchanged (not even sanitized: there is nothing
/// to reconcile against). Otherwise each parent class is transformed
/// independently and the classes are concatenated in original class
/// order, so the output game order is deterministic regardless of how
/// callers schedule the surrounding stages.
pub fn apply(dat: &Dat, mode: Option<MergeMode>) -> Dat {
    let Some(mode) = mode else {
        return dat.clone();
    };
    if !dat.has_parent_clone_info() {
        return dat.clone();
    }

    let by_name: HashMap<&str, &Game> = dat.games.iter().map(|g| (g.name.as_str(), g)).collect();
    let mut nested = false;
    let mut games = Vec::with_capacity(dat.games.len());
    for set in dat.parents() {
        games.extend(transform_class(&by_name, &set, mode, &mut nested));
    }

    let mut header = dat.header.clone();
    header.nested_rom_names = header.nested_rom_names || nested;
    Dat { header, games }
}

fn transform_class(
    by_name: &HashMap<&str, &Game>,
    set: &ParentSet,
    mode: MergeMode,
    nested: &mut bool,
) -> Vec<Game> {
    let mut games: Vec<Game> =
        set.games().map(|game| transform_game(by_name, game.clone(), mode)).collect();

    if mode != MergeMode::Merged || set.parent.is_none() || set.clones.is_empty() {
        return games;
    }

    // Fold the class into a single machine with the parent's identity.
    // Clone ROMs come first (original clone order), re-parented under the
    // clone's name, then the parent's own ROMs, deduplicated by identity.
    let mut folded = games.remove(0);
    let mut roms = Vec::new();
    for clone in games {
        for rom in clone.roms {
            roms.push(rom.reparented(&clone.name));
            *nested = true;
        }
    }
    roms.extend(folded.roms);
    folded.roms = dedupe_by_key(roms);
    folded.is_machine = true;
    vec![folded]
}

fn transform_game(by_name: &HashMap<&str, &Game>, mut game: Game, mode: MergeMode) -> Game {
    let mut roms = sanitize(std::mem::take(&mut game.roms));

    if mode.is_full() {
        // Self-contained sets inline their device dependencies. BIOS ROMs
        // stay in-set: subtracting them here would contradict the mode.
        if game.is_machine && !game.device_refs.is_empty() {
            let mut expanded = Vec::new();
            for device_ref in &game.device_refs {
                match by_name.get(device_ref.as_str()) {
                    Some(device) => expanded.extend(device.roms.iter().cloned()),
                    None => {
                        tracing::debug!(machine = %game.name, device = %device_ref, "unresolved device reference dropped");
                    },
                }
            }
            expanded.extend(roms);
            roms = sanitize(expanded);
        }
    } else {
        if let Some(bios_name) = game.bios_parent() {
            match by_name.get(bios_name) {
                Some(bios) => {
                    let firmware: Vec<&Rom> = bios.roms.iter().filter(|r| r.bios).collect();
                    roms = subtract(&firmware, roms);
                },
                None => {
                    tracing::debug!(game = %game.name, bios = %bios_name, "unresolved BIOS reference ignored");
                },
            }
        }
        if mode.subtracts_parent()
            && let Some(parent_name) = game.clone_of.as_deref()
        {
            match by_name.get(parent_name) {
                Some(parent) => {
                    let reference: Vec<&Rom> = parent.roms.iter().collect();
                    roms = subtract(&reference, roms);
                },
                None => {
                    tracing::debug!(clone = %game.name, parent = %parent_name, "unresolved parent reference ignored");
                },
            }
        }
    }

    game.roms = roms;
    game
}

/// Canonical per-game sanitization: drop duplicate ROMs by name (first
/// occurrence wins), then sort by the natural-numeric name comparator.
fn sanitize(roms: Vec<Rom>) -> Vec<Rom> {
    let mut seen = HashSet::new();
    let mut roms: Vec<Rom> = roms.into_iter().filter(|rom| seen.insert(rom.name.clone())).collect();
    roms.sort_by(|a, b| rom_name_cmp(&a.name, &b.name));
    roms
}

fn dedupe_by_key(roms: Vec<Rom>) -> Vec<Rom> {
    let mut seen = HashSet::new();
    roms.into_iter()
        .filter(|rom| seen.insert((rom.name.clone(), rom.size, rom.crc.clone())))
        .collect()
}

/// The diff rule: keep a subject ROM unless the reference set has a ROM
/// under the subject's effective name with the same fingerprint.
fn subtract(reference: &[&Rom], subject: Vec<Rom>) -> Vec<Rom> {
    let reference: HashMap<&str, &str> =
        reference.iter().map(|r| (r.name.as_str(), r.crc.as_str())).collect();
    subject
        .into_iter()
        .filter(|rom| match reference.get(rom.effective_name()) {
            None => true,
            Some(crc) => *crc != rom.crc,
        })
        .collect()
}

/// Natural-numeric name comparator. Hyphens are substituted with `__`
/// before comparison so they sort after underscores per ASCII order,
/// sidestepping locale-collation surprises.
fn rom_name_cmp(a: &str, b: &str) -> Ordering {
    natural_cmp(&a.replace('-', "__"), &b.replace('-', "__"))
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0usize, 0usize);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let run_a = digit_run(a, &mut i);
            let run_b = digit_run(b, &mut j);
            let trimmed_a = trim_zeros(run_a);
            let trimmed_b = trim_zeros(run_b);
            let ordering = trimmed_a
                .len()
                .cmp(&trimmed_b.len())
                .then_with(|| trimmed_a.cmp(trimmed_b))
                // Equal values with different zero-padding: shorter first.
                .then_with(|| run_a.len().cmp(&run_b.len()));
            if ordering != Ordering::Equal {
                return ordering;
            }
        } else {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                },
                ordering => return ordering,
            }
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run<'a>(bytes: &'a [u8], at: &mut usize) -> &'a [u8] {
    let start = *at;
    while *at < bytes.len() && bytes[*at].is_ascii_digit() {
        *at += 1;
    }
    &bytes[start..*at]
}

fn trim_zeros(run: &[u8]) -> &[u8] {
    let nonzero = run.iter().position(|&b| b != b'0').unwrap_or(run.len().saturating_sub(1));
    &run[nonzero..]
}
