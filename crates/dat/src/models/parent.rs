use super::Game;

/// A parent/clone equivalence class: one parent game (when it exists) plus
/// every clone pointing at it.
///
/// Grouping handles are derived on demand from a [`Dat`](super::Dat) and
/// never persisted; they borrow nothing so a class can outlive the
/// derivation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentSet {
    /// The parent game; `None` for an orphan clone whose parent is missing
    /// from the catalog.
    pub parent: Option<Game>,
    /// Clones in original catalog order.
    pub clones: Vec<Game>,
}

impl ParentSet {
    /// The class is named after its parent, falling back to the first
    /// clone for orphan classes.
    pub fn name(&self) -> &str {
        match &self.parent {
            Some(parent) => &parent.name,
            // Derivation guarantees an orphan class holds at least one clone.
            None => self.clones.first().map(|c| c.name.as_str()).unwrap_or(""),
        }
    }

    /// Every game in the class, parent first.
    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.parent.iter().chain(self.clones.iter())
    }

    pub fn len(&self) -> usize {
        usize::from(self.parent.is_some()) + self.clones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
