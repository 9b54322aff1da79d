use super::Rom;

/// How a game relates to the rest of its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A canonical game with at least one clone pointing at it.
    Parent,
    /// A variant pointing at a parent via its clone link.
    Clone,
    /// Neither: no clone link in, no clone link out.
    Standalone,
}

/// A named set of ROMs.
///
/// Arcade-style catalogs specialize this with device references and call it
/// a "machine"; rather than a parallel type hierarchy, the machine extras
/// live directly on the value and `is_machine` gates the operations that
/// only make sense for arcade sets (device-ROM expansion, mostly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub name: String,
    pub description: Option<String>,
    /// Clone link: the name of this game's parent, when it is a clone.
    pub clone_of: Option<String>,
    /// External BIOS dependency: the name of the game whose bios-flagged
    /// ROMs this game shares.
    pub rom_of: Option<String>,
    /// Names of device games whose ROMs are required for full operation.
    /// Only meaningful on machine-kind games.
    pub device_refs: Vec<String>,
    /// Arcade-style machine rather than a plain game entry.
    pub is_machine: bool,
    pub roms: Vec<Rom>,
}

impl Game {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            clone_of: None,
            rom_of: None,
            device_refs: Vec::new(),
            is_machine: false,
            roms: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_clone_of(mut self, parent: impl Into<String>) -> Self {
        self.clone_of = Some(parent.into());
        self
    }

    pub fn with_rom_of(mut self, bios: impl Into<String>) -> Self {
        self.rom_of = Some(bios.into());
        self
    }

    pub fn with_device_refs(mut self, refs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.device_refs = refs.into_iter().map(Into::into).collect();
        self.is_machine = true;
        self
    }

    pub fn as_machine(mut self) -> Self {
        self.is_machine = true;
        self
    }

    pub fn with_roms(mut self, roms: impl IntoIterator<Item = Rom>) -> Self {
        self.roms = roms.into_iter().collect();
        self
    }

    /// A game with an empty clone link is a parent or standalone.
    pub fn is_clone(&self) -> bool {
        self.clone_of.is_some()
    }

    /// The BIOS set this game depends on, if any.
    pub fn bios_parent(&self) -> Option<&str> {
        self.rom_of.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_refs_imply_machine() {
        let game = Game::new("driver").with_device_refs(["dev1", "dev2"]);
        assert!(game.is_machine);
        assert_eq!(game.device_refs, vec!["dev1", "dev2"]);
    }

    #[test]
    fn test_clone_detection() {
        assert!(!Game::new("parent").is_clone());
        assert!(Game::new("variant").with_clone_of("parent").is_clone());
    }
}
