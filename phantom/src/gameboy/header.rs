use std::fmt;

use serde::{Deserialize, Serialize};

/// This struct represents a DMG ROM header. Per the Pan Docs, the header of the ROM occupies the
/// region between `0x100` and `0x14F`.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartridgeHeader {
    /// The memory region between `0x100` and `0x103`. Usually a `NOP` followed by a `JP`.
    pub entrypoint: [u8; 4],
    /// The memory region between `0x134` and `0x143`, up to the first NUL. Newer cartridges
    /// reuse the tail of this region for the manufacturer code and CGB flag.
    pub title: String,
    /// The memory region between `0x13F` and `0x142`.
    pub manufacturer: [u8; 4],
    /// The byte at `0x143`. `0x80` means the game supports CGB enhancements, `0xC0` means it
    /// requires a CGB.
    pub cgb_flag: u8,
    /// The two ASCII characters at `0x144` and `0x145`. Only used when `old_licensee` is `0x33`.
    pub new_licensee: [u8; 2],
    /// The byte at `0x146`. `0x03` means the game supports SGB functions.
    pub sgb_flag: u8,
    /// The byte at `0x147`, which selects the bank controller and other hardware.
    pub cartridge_type: u8,
    /// The byte at `0x148`. The ROM is `32 KiB << rom_size` long.
    pub rom_size: u8,
    /// The byte at `0x149`.
    pub ram_size: u8,
    /// The byte at `0x14A`. `0x00` is Japan, `0x01` is overseas.
    pub destination: u8,
    /// The byte at `0x14B`.
    pub old_licensee: u8,
    /// The byte at `0x14C`.
    pub mask_rom_version: u8,
    /// The byte at `0x14D`. On start, the header is checksummed. The check spans `0x134` through
    /// `0x14C`. The result of the checksum must match this value or the boot up will fail.
    pub header_checksum: u8,
    /// The big endian word at `0x14E` and `0x14F`. This is a checksum of the entire ROM sans
    /// these two bytes. Real hardware never verifies it.
    pub global_checksum: u16,
}

impl CartridgeHeader {
    pub const START_ADDR: usize = 0x100;
    pub const END_ADDR: usize = 0x14F;
    pub const LENGTH: usize = Self::END_ADDR - Self::START_ADDR + 1;

    /// Pulls the header out of a ROM image. Returns `None` if the image is too short to have one.
    pub fn parse(rom: &[u8]) -> Option<Self> {
        let header: &[u8; Self::LENGTH] = rom
            .get(Self::START_ADDR..Self::START_ADDR + Self::LENGTH)?
            .try_into()
            .ok()?;
        let at = |addr: usize| header[addr - Self::START_ADDR];

        let title = header[0x134 - Self::START_ADDR..=0x143 - Self::START_ADDR]
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| *b as char)
            .collect();
        Some(Self {
            entrypoint: [at(0x100), at(0x101), at(0x102), at(0x103)],
            title,
            manufacturer: [at(0x13F), at(0x140), at(0x141), at(0x142)],
            cgb_flag: at(0x143),
            new_licensee: [at(0x144), at(0x145)],
            sgb_flag: at(0x146),
            cartridge_type: at(0x147),
            rom_size: at(0x148),
            ram_size: at(0x149),
            destination: at(0x14A),
            old_licensee: at(0x14B),
            mask_rom_version: at(0x14C),
            header_checksum: at(0x14D),
            global_checksum: u16::from_be_bytes([at(0x14E), at(0x14F)]),
        })
    }

    /// Runs the boot ROM's header checksum over `0x134..=0x14C` of the given image.
    pub fn compute_header_checksum(rom: &[u8]) -> Option<u8> {
        let digest = rom
            .get(0x134..=0x14C)?
            .iter()
            .fold(0u8, |digest, b| digest.wrapping_sub(*b).wrapping_sub(1));
        Some(digest)
    }

    /// Returns if the header checksum stored in the image matches the computed one.
    pub fn header_checksum_ok(&self, rom: &[u8]) -> bool {
        Self::compute_header_checksum(rom) == Some(self.header_checksum)
    }

    /// The size of the ROM in bytes, as declared by the header.
    pub fn declared_rom_size(&self) -> Option<usize> {
        (self.rom_size <= 8).then(|| 0x8000 << self.rom_size)
    }
}

impl fmt::Display for CartridgeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title:             {}", self.title)?;
        writeln!(
            f,
            "Manufacturer:      {}",
            String::from_utf8_lossy(&self.manufacturer)
        )?;
        writeln!(f, "CGB flag:          0x{:0>2X}", self.cgb_flag)?;
        writeln!(
            f,
            "New licensee:      {}",
            String::from_utf8_lossy(&self.new_licensee)
        )?;
        writeln!(f, "SGB flag:          0x{:0>2X}", self.sgb_flag)?;
        writeln!(f, "Cartridge type:    0x{:0>2X}", self.cartridge_type)?;
        writeln!(f, "ROM size:          0x{:0>2X}", self.rom_size)?;
        writeln!(f, "RAM size:          0x{:0>2X}", self.ram_size)?;
        writeln!(f, "Destination:       0x{:0>2X}", self.destination)?;
        writeln!(f, "Old licensee:      0x{:0>2X}", self.old_licensee)?;
        writeln!(f, "Mask ROM version:  0x{:0>2X}", self.mask_rom_version)?;
        writeln!(f, "Header checksum:   0x{:0>2X}", self.header_checksum)?;
        write!(f, "Global checksum:   0x{:0>4X}", self.global_checksum)
    }
}
