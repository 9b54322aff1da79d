//! ROM-format header detection.
//!
//! Some console dump formats prepend a fixed-size housekeeping header to
//! the cartridge bytes; catalogs checksum the cartridge bytes alone, so a
//! headered dump only matches after the prefix is skipped. Detection is
//! magic-byte sniffing over the file head, same trick every container
//! sniffer uses.

/// Descriptor for a known ROM-format header prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomHeader {
    /// Short format tag, e.g. `ines`.
    pub name: &'static str,
    /// Byte offset of the magic within the file.
    magic_offset: usize,
    magic: &'static [u8],
    /// Total header length: the number of bytes to skip before the
    /// cartridge data begins.
    pub len: u64,
}

/// Every format this tool recognises.
const KNOWN: [RomHeader; 4] = [
    // Nintendo Entertainment System (iNES container).
    RomHeader { name: "ines", magic_offset: 0, magic: b"NES\x1a", len: 16 },
    // Famicom Disk System.
    RomHeader { name: "fds", magic_offset: 0, magic: b"FDS\x1a", len: 16 },
    // Atari Lynx (LNX container).
    RomHeader { name: "lynx", magic_offset: 0, magic: b"LYNX", len: 64 },
    // Atari 7800; the magic sits one byte in.
    RomHeader { name: "a7800", magic_offset: 1, magic: b"ATARI7800", len: 128 },
];

/// How many head bytes [`detect`] needs to see to make a decision.
pub const PROBE_LEN: usize = 16;

/// Sniff a file head for a known ROM-format header.
pub fn detect(head: &[u8]) -> Option<RomHeader> {
    KNOWN.into_iter().find(|header| {
        head.len() >= header.magic_offset + header.magic.len()
            && &head[header.magic_offset..header.magic_offset + header.magic.len()] == header.magic
    })
}

impl RomHeader {
    /// Offset of the cartridge data in a headered file.
    pub fn data_offset(&self) -> usize {
        self.len as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_ines() {
        let mut head = vec![0u8; PROBE_LEN];
        head[..4].copy_from_slice(b"NES\x1a");
        let header = detect(&head).unwrap();
        assert_eq!(header.name, "ines");
        assert_eq!(header.len, 16);
    }

    #[test]
    fn test_detects_a7800_at_offset_one() {
        let mut head = vec![0u8; PROBE_LEN];
        head[1..10].copy_from_slice(b"ATARI7800");
        let header = detect(&head).unwrap();
        assert_eq!(header.name, "a7800");
        assert_eq!(header.data_offset(), 128);
    }

    #[test]
    fn test_plain_rom_has_no_header() {
        assert!(detect(&[0x4e, 0x45, 0x00, 0x00, 0x00, 0x00]).is_none());
        assert!(detect(b"SEGA GENESIS    ").is_none());
    }

    #[test]
    fn test_short_head_is_safe() {
        assert!(detect(b"").is_none());
        assert!(detect(b"NE").is_none());
        // Exactly the magic, nothing more.
        assert_eq!(detect(b"LYNX").unwrap().name, "lynx");
    }
}
