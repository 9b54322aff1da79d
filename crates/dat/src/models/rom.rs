/// A declared file within a [`Game`](super::Game).
///
/// Identity for deduplication purposes is the full (name, size, crc)
/// triple: two ROMs with the same name but different checksums are
/// different ROMs (regional variant, bad dump, whatever), and the merge
/// arithmetic has to keep them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rom {
    /// Name as declared in the catalog; a relative path, possibly with
    /// directory components after a merged transform.
    pub name: String,
    /// Expected size in bytes.
    pub size: u64,
    /// Zero-padded 8-hex-digit CRC32 of the ROM contents.
    pub crc: String,
    /// Name under which the same bytes appear in the parent/BIOS set.
    pub merge: Option<String>,
    /// Marks a ROM belonging to a BIOS set's shared firmware.
    pub bios: bool,
}

impl Rom {
    pub fn new(name: impl Into<String>, size: u64, crc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            crc: crc.into(),
            merge: None,
            bios: false,
        }
    }

    pub fn with_merge(mut self, merge: impl Into<String>) -> Self {
        self.merge = Some(merge.into());
        self
    }

    pub fn with_bios(mut self, bios: bool) -> Self {
        self.bios = bios;
        self
    }

    /// The name this ROM is known by in its parent/BIOS set; used as the
    /// lookup key when subtracting a reference set.
    pub fn effective_name(&self) -> &str {
        self.merge.as_deref().unwrap_or(&self.name)
    }

    /// Deduplication key: (name, size, crc).
    pub fn key(&self) -> (&str, u64, &str) {
        (&self.name, self.size, &self.crc)
    }

    /// Re-parent this ROM under a clone's directory, preserving where the
    /// bytes came from when a class is folded into a single merged set.
    /// The separator is a literal backslash per the catalog dialect.
    pub(crate) fn reparented(mut self, owner: &str) -> Self {
        self.name = format!("{owner}\\{}", self.name);
        self
    }
}
