//! The Game Boy's 16-bit address space.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use tracing::{trace, warn};

/// This trait is used to abstract over the memory map. The CPU only ever touches memory through
/// it, which makes it the seam for bank controllers and test doubles.
pub trait MemoryLike {
    fn read_byte(&self, addr: u16) -> u8;

    fn write_byte(&mut self, addr: u16, val: u8);
}

/// Helpers built on top of [`MemoryLike`]. Kept separate since the `impl FnOnce` in `update_byte`
/// would make `MemoryLike` non-object safe.
pub trait MemoryLikeExt: MemoryLike {
    fn update_byte(&mut self, addr: u16, op: impl FnOnce(&mut u8)) -> u8 {
        let mut val = self.read_byte(addr);
        op(&mut val);
        self.write_byte(addr, val);
        val
    }

    /// Reads a little endian word.
    fn read_word(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }

    /// Writes a little endian word.
    fn write_word(&mut self, addr: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.write_byte(addr, lo);
        self.write_byte(addr.wrapping_add(1), hi);
    }
}

impl<T: MemoryLike + ?Sized> MemoryLikeExt for T {}

/// The named areas of the address space.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum Region {
    #[display("ROM bank 00")]
    RomBank0,
    #[display("ROM bank NN")]
    RomBankN,
    #[display("VRAM")]
    VideoRam,
    #[display("external RAM")]
    ExternalRam,
    #[display("WRAM")]
    WorkRam,
    #[display("WRAM bank 1")]
    WorkRamBank,
    /// Mirrors `0xC000..=0xDDFF`.
    #[display("echo RAM")]
    Echo,
    #[display("OAM")]
    Oam,
    /// Reads as `0xFF`, writes are dropped.
    #[display("unusable")]
    Unusable,
    #[display("I/O registers")]
    Io,
    #[display("HRAM")]
    HighRam,
    #[display("interrupt enable")]
    InterruptEnable,
}

impl Region {
    pub const fn of(addr: u16) -> Self {
        match addr {
            0x0000..=0x3FFF => Region::RomBank0,
            0x4000..=0x7FFF => Region::RomBankN,
            0x8000..=0x9FFF => Region::VideoRam,
            0xA000..=0xBFFF => Region::ExternalRam,
            0xC000..=0xCFFF => Region::WorkRam,
            0xD000..=0xDFFF => Region::WorkRamBank,
            0xE000..=0xFDFF => Region::Echo,
            0xFE00..=0xFE9F => Region::Oam,
            0xFEA0..=0xFEFF => Region::Unusable,
            0xFF00..=0xFF7F => Region::Io,
            0xFF80..=0xFFFE => Region::HighRam,
            0xFFFF => Region::InterruptEnable,
        }
    }

    /// Finds the region `addr` falls in and how far into that region it is.
    pub const fn locate(addr: u16) -> (Self, u16) {
        let region = Self::of(addr);
        (region, addr - *region.range().start())
    }

    pub const fn range(self) -> RangeInclusive<u16> {
        match self {
            Region::RomBank0 => 0x0000..=0x3FFF,
            Region::RomBankN => 0x4000..=0x7FFF,
            Region::VideoRam => 0x8000..=0x9FFF,
            Region::ExternalRam => 0xA000..=0xBFFF,
            Region::WorkRam => 0xC000..=0xCFFF,
            Region::WorkRamBank => 0xD000..=0xDFFF,
            Region::Echo => 0xE000..=0xFDFF,
            Region::Oam => 0xFE00..=0xFE9F,
            Region::Unusable => 0xFEA0..=0xFEFF,
            Region::Io => 0xFF00..=0xFF7F,
            Region::HighRam => 0xFF80..=0xFFFE,
            Region::InterruptEnable => 0xFFFF..=0xFFFF,
        }
    }
}

/// The size of the ROM window, `0x0000..=0x7FFF`.
pub const ROM_SIZE: usize = 0x8000;

#[serde_as]
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMap {
    // Both ROM banks. Without a bank controller, bank NN is always bank 01.
    #[serde(serialize_with = "crate::utils::serialize_slices_as_one")]
    #[serde(deserialize_with = "crate::utils::deserialize_slices_as_one")]
    rom: [[u8; 0x4000]; 2],
    #[serde_as(as = "serde_with::Bytes")]
    vram: [u8; 0x2000],
    #[serde_as(as = "serde_with::Bytes")]
    eram: [u8; 0x2000],
    #[serde(serialize_with = "crate::utils::serialize_slices_as_one")]
    #[serde(deserialize_with = "crate::utils::deserialize_slices_as_one")]
    wram: [[u8; 0x1000]; 2],
    #[serde_as(as = "serde_with::Bytes")]
    oam: [u8; 0xA0],
    #[serde_as(as = "serde_with::Bytes")]
    io: [u8; 0x80],
    // High RAM
    #[serde_as(as = "serde_with::Bytes")]
    hr: [u8; 0x7F],
    /// The interrupt enable register. When indexed, this register is at 0xFFFF.
    pub ie: u8,
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self {
            rom: [[0; 0x4000]; 2],
            vram: [0; 0x2000],
            eram: [0; 0x2000],
            wram: [[0; 0x1000]; 2],
            oam: [0; 0xA0],
            io: [0; 0x80],
            hr: [0; 0x7F],
            ie: 0,
        }
    }
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies a program image into the ROM window, starting at `0x0000`. Anything past the window
    /// is dropped and the rest of the window is zeroed. Returns the number of bytes copied.
    pub fn load_image(&mut self, image: &[u8]) -> usize {
        let len = image.len().min(ROM_SIZE);
        let (bank0, bank_n) = image[..len].split_at(len.min(0x4000));
        self.rom = [[0; 0x4000]; 2];
        self.rom[0][..bank0.len()].copy_from_slice(bank0);
        self.rom[1][..bank_n.len()].copy_from_slice(bank_n);
        len
    }

    /// The contents of VRAM, `0x8000..=0x9FFF`.
    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    /// Returns if a program has turned off the boot ROM by writing to `0xFF50`.
    pub fn boot_rom_disabled(&self) -> bool {
        self.io[0x50] != 0
    }
}

impl MemoryLike for MemoryMap {
    fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            n @ 0x0000..=0x3FFF => self.rom[0][n as usize],
            n @ 0x4000..=0x7FFF => self.rom[1][n as usize - 0x4000],
            n @ 0x8000..=0x9FFF => self.vram[n as usize - 0x8000],
            n @ 0xA000..=0xBFFF => self.eram[n as usize - 0xA000],
            n @ 0xC000..=0xCFFF => self.wram[0][n as usize - 0xC000],
            n @ 0xD000..=0xDFFF => self.wram[1][n as usize - 0xD000],
            // Echo RAM
            n @ 0xE000..=0xEFFF => self.wram[0][n as usize - 0xE000],
            n @ 0xF000..=0xFDFF => self.wram[1][n as usize - 0xF000],
            n @ 0xFE00..=0xFE9F => self.oam[n as usize - 0xFE00],
            0xFEA0..=0xFEFF => 0xFF,
            n @ 0xFF00..=0xFF7F => self.io[n as usize - 0xFF00],
            n @ 0xFF80..=0xFFFE => self.hr[n as usize - 0xFF80],
            0xFFFF => self.ie,
        }
    }

    fn write_byte(&mut self, addr: u16, val: u8) {
        trace!("Mut index into MemMap: 0x{addr:0>4X}");
        match addr {
            n @ 0x0000..=0x7FFF => dropped_write(n, val),
            n @ 0x8000..=0x9FFF => self.vram[n as usize - 0x8000] = val,
            n @ 0xA000..=0xBFFF => self.eram[n as usize - 0xA000] = val,
            n @ 0xC000..=0xCFFF => self.wram[0][n as usize - 0xC000] = val,
            n @ 0xD000..=0xDFFF => self.wram[1][n as usize - 0xD000] = val,
            // Echo RAM
            n @ 0xE000..=0xEFFF => self.wram[0][n as usize - 0xE000] = val,
            n @ 0xF000..=0xFDFF => self.wram[1][n as usize - 0xF000] = val,
            n @ 0xFE00..=0xFE9F => self.oam[n as usize - 0xFE00] = val,
            // NOTE: This region *should not* actually be accessed
            n @ 0xFEA0..=0xFEFF => dropped_write(n, val),
            n @ 0xFF00..=0xFF7F => self.io[n as usize - 0xFF00] = val,
            n @ 0xFF80..=0xFFFE => self.hr[n as usize - 0xFF80] = val,
            0xFFFF => self.ie = val,
        }
    }
}

fn dropped_write(addr: u16, val: u8) {
    let (region, offset) = Region::locate(addr);
    warn!("Dropped write of 0x{val:0>2X} to {region} +0x{offset:0>4X} @ 0x{addr:0>4X}");
}
