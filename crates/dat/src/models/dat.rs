use super::{DatHeader, Game, ParentSet, Role};
use std::collections::HashMap;

/// A named catalog: a header plus an ordered set of games.
///
/// Games are immutable once the catalog is built; transforms (see
/// [`merge`](crate::merge)) produce a new `Dat` rather than mutating in
/// place. Parent/clone classes are derived on demand via [`parents`](Self::parents).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dat {
    pub header: DatHeader,
    pub games: Vec<Game>,
}

impl Dat {
    pub fn new(header: DatHeader, games: impl IntoIterator<Item = Game>) -> Self {
        Self { header, games: games.into_iter().collect() }
    }

    /// Look up a game by name with a linear walk. The merge transform
    /// resolves references against its own one-shot name map instead of
    /// calling this in a loop.
    pub fn game(&self, name: &str) -> Option<&Game> {
        self.games.iter().find(|g| g.name == name)
    }

    /// Whether any game carries clone or BIOS links. A catalog without
    /// them has nothing for the merge arithmetic to do.
    pub fn has_parent_clone_info(&self) -> bool {
        self.games.iter().any(|g| g.clone_of.is_some() || g.rom_of.is_some())
    }

    /// Derive the parent/clone equivalence classes.
    ///
    /// Class order follows the first appearance of each parent in the game
    /// list; orphan clones (whose parent is missing from the catalog) each
    /// form their own singleton class, appended in catalog order. Every
    /// game lands in exactly one class.
    pub fn parents(&self) -> Vec<ParentSet> {
        let mut sets: Vec<ParentSet> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for game in &self.games {
            if !game.is_clone() {
                index.insert(game.name.as_str(), sets.len());
                sets.push(ParentSet { parent: Some(game.clone()), clones: Vec::new() });
            }
        }
        // Second pass so clones can reference parents declared after them.
        for game in &self.games {
            if let Some(parent) = game.clone_of.as_deref() {
                match index.get(parent) {
                    Some(&at) => sets[at].clones.push(game.clone()),
                    None => {
                        tracing::debug!(clone = %game.name, parent, "clone references a missing parent; treating as its own class");
                        sets.push(ParentSet { parent: None, clones: vec![game.clone()] });
                    },
                }
            }
        }
        sets
    }

    /// Classify a game's role within this catalog.
    pub fn role(&self, name: &str) -> Option<Role> {
        let game = self.game(name)?;
        if game.is_clone() {
            return Some(Role::Clone);
        }
        match self.games.iter().any(|g| g.clone_of.as_deref() == Some(name)) {
            true => Some(Role::Parent),
            false => Some(Role::Standalone),
        }
    }

    /// The filename a serialized copy of this catalog should be written
    /// under. Callers sanitize it for their platform before use.
    pub fn filename(&self) -> String {
        format!("{}.dat", self.header.name)
    }
}
