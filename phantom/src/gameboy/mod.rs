//! The Game Boy (DMG) CPU.
//!
//! This is the CPU and its bus, not a whole handheld. There is no PPU, APU, timer, or interrupt
//! dispatch. A [`GameBoy`] must be ticked forward by its host, one instruction at a time, which
//! leaves managing the tick rate and IO to the host.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::{
    config::{BootMode, GameBoyConfig},
    session::{EmulationInfo, Emulator, LastInstruction},
    utils::HexDump,
    LoadError,
};

pub mod cpu;
pub mod header;
pub mod instruction;
pub mod lookup;
pub mod mem;
pub mod registers;

#[cfg(test)]
mod cpu_tests;

pub use cpu::{Cpu, CpuState};
pub use header::CartridgeHeader;
pub use mem::{MemoryLike, MemoryLikeExt, MemoryMap, Region, ROM_SIZE};
pub use registers::{Flags, HalfRegister, RegisterPair, Registers};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

/// The I/O registers that have a fixed value at power on.
const POWER_ON_IO: [(u16, u8); 7] = [
    // IF
    (0xFF0F, 0xE0),
    // LCDC
    (0xFF40, 0x91),
    // STAT
    (0xFF41, 0x81),
    // BGP
    (0xFF47, 0xFC),
    // OBP0
    (0xFF48, 0xFF),
    // OBP1
    (0xFF49, 0xFF),
    // IE
    (0xFFFF, 0x00),
];

/// This is the core emulation primitive. It holds the CPU, everything the CPU can address, and
/// the header of the loaded cartridge (if it has one).
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameBoy {
    pub cpu: Cpu,
    pub mem: MemoryMap,
    header: Option<CartridgeHeader>,
    boot: BootMode,
}

impl GameBoy {
    /// Constructs a powered on Game Boy with nothing loaded.
    pub fn new(config: &GameBoyConfig) -> Self {
        let mut digest = Self {
            cpu: Cpu::new(),
            mem: MemoryMap::new(),
            header: None,
            boot: config.boot,
        };
        digest.power_on();
        digest
    }

    pub fn with_rom(config: &GameBoyConfig, rom: &[u8]) -> Result<Self, LoadError> {
        let mut digest = Self::new(config);
        digest.load_rom(rom)?;
        Ok(digest)
    }

    /// Resets the CPU and I/O registers to their power on values. RAM and ROM are left alone.
    pub fn power_on(&mut self) {
        self.cpu = Cpu::new();
        self.cpu.sp = 0xFFFE;
        for (addr, val) in POWER_ON_IO {
            self.mem.write_byte(addr, val);
        }
        if self.boot == BootMode::Cartridge {
            // Where the boot ROM leaves things
            self.cpu.regs.set_wide(RegisterPair::AF, 0x01B0);
            self.cpu.regs.set_wide(RegisterPair::BC, 0x0013);
            self.cpu.regs.set_wide(RegisterPair::DE, 0x00D8);
            self.cpu.regs.set_wide(RegisterPair::HL, 0x014D);
            self.cpu.pc = 0x0100;
        }
        debug!("Powered on in {} mode", self.boot);
    }

    pub fn header(&self) -> Option<&CartridgeHeader> {
        self.header.as_ref()
    }

    pub fn state(&self) -> CpuState {
        self.cpu.state
    }
}

impl Emulator for GameBoy {
    fn info(&self) -> EmulationInfo {
        EmulationInfo {
            name: "Game Boy",
            display_width: SCREEN_WIDTH,
            display_height: SCREEN_HEIGHT,
            scale: 2,
        }
    }

    fn load_rom(&mut self, rom: &[u8]) -> Result<usize, LoadError> {
        if rom.is_empty() {
            return Err(LoadError::Empty);
        }
        if rom.len() > ROM_SIZE {
            return Err(LoadError::TooLarge {
                len: rom.len(),
                max: ROM_SIZE,
            });
        }
        self.mem = MemoryMap::new();
        let len = self.mem.load_image(rom);
        self.header = CartridgeHeader::parse(rom);
        match &self.header {
            Some(header) => {
                info!("Cartridge header:\n{header}");
                if !header.header_checksum_ok(rom) {
                    warn!("Header checksum mismatch, real hardware would refuse to boot this");
                }
            }
            None if self.boot == BootMode::Cartridge => {
                warn!("Image is too short to have a cartridge header")
            }
            None => {}
        }
        trace!("\n{}", HexDump(rom));
        self.power_on();
        debug!("Loaded {len} byte Game Boy program");
        Ok(len)
    }

    fn tick(&mut self) -> u8 {
        self.cpu.tick(&mut self.mem)
    }

    /// The DMG joypad is not emulated, so key presses are only logged.
    fn set_keyboard_value(&mut self, key: u8) {
        trace!("Ignoring key 0x{key:0>2X}");
    }

    fn release_key(&mut self) {}

    /// The DIV and TIMA registers are not emulated, so there is nothing to count down.
    fn tick_timers(&mut self) {}

    fn last_instruction(&self) -> LastInstruction {
        self.cpu.last_instruction
    }

    /// Without a PPU, the closest thing to a display is VRAM itself.
    fn display(&self) -> &[u8] {
        self.mem.vram()
    }

    fn is_halted(&self) -> bool {
        !self.cpu.is_running()
    }

    fn resume(&mut self) {
        self.cpu.state = CpuState::Running;
    }
}
