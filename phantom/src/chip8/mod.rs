//! The CHIP-8 virtual machine.
//!
//! The machine has 4 KiB of memory, sixteen 8-bit registers (`V0` through `VF`, with `VF` doubling
//! as the flag register), a 12-bit index register, a sixteen deep call stack, two countdown timers,
//! and a 64x32 monochrome screen. The built-in font lives at `0x000` and programs are loaded at
//! `0x200`.

use std::fmt;

use heapless::Vec as InlineVec;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, error, trace, warn};

use crate::{
    config::{Chip8Config, Quirks},
    session::{EmulationInfo, Emulator, LastInstruction},
    utils::HexDump,
    Fault, LoadError,
};

pub mod instruction;
pub mod lookup;
pub mod screen;


pub use instruction::{Chip8Instruction, Chip8Op, Operands};
pub use screen::{Screen, SCREEN_HEIGHT, SCREEN_WIDTH};

pub const MEMORY_SIZE: usize = 0x1000;
pub const FONT_START: u16 = 0x000;
pub const PROGRAM_START: u16 = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;
pub const STACK_DEPTH: usize = 16;
/// Addresses are 12 bits wide. Anything above wraps around.
const ADDR_MASK: u16 = 0x0FFF;

/// Glyphs for the hex digits `0` through `F`, five bytes each.
pub static FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, derive_more::IsVariant)]
pub enum RunState {
    #[default]
    Running,
    Halted(Fault),
}

#[derive(Debug, Clone)]
pub struct Chip8 {
    pub memory: [u8; MEMORY_SIZE],
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub stack: InlineVec<u16, STACK_DEPTH>,
    pub delay: u8,
    pub sound: u8,
    pub screen: Screen,
    keyboard: Option<u8>,
    last_instruction: LastInstruction,
    state: RunState,
    quirks: Quirks,
    rng: StdRng,
}

impl Chip8 {
    /// Constructs a powered on machine with no program loaded.
    pub fn new(config: &Chip8Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut digest = Self {
            memory: [0; MEMORY_SIZE],
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            stack: InlineVec::new(),
            delay: 0,
            sound: 0,
            screen: Screen::default(),
            keyboard: None,
            last_instruction: LastInstruction::Nothing,
            state: RunState::Running,
            quirks: config.quirks,
            rng,
        };
        digest.reset();
        digest
    }

    /// Constructs a powered on machine with the given program loaded.
    pub fn with_rom(config: &Chip8Config, rom: &[u8]) -> Result<Self, LoadError> {
        let mut digest = Self::new(config);
        digest.load_rom(rom)?;
        Ok(digest)
    }

    /// Returns the machine to its power on state. The RNG and quirks are kept.
    pub fn reset(&mut self) {
        self.memory.fill(0);
        let font = FONT_START as usize;
        self.memory[font..font + FONT.len()].copy_from_slice(&FONT);
        self.v = [0; 16];
        self.i = 0;
        self.pc = PROGRAM_START;
        self.stack.clear();
        self.delay = 0;
        self.sound = 0;
        self.screen.clear();
        self.keyboard = None;
        self.last_instruction = LastInstruction::Nothing;
        self.state = RunState::Running;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn keyboard(&self) -> Option<u8> {
        self.keyboard
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        self.memory[(addr & ADDR_MASK) as usize]
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        self.memory[(addr & ADDR_MASK) as usize] = val;
    }

    /// Reads the big endian word at the given address.
    pub fn read_word(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }

    /// Returns if the sound timer is running, i.e. the buzzer should sound.
    pub fn is_buzzing(&self) -> bool {
        self.sound > 0
    }

    /// Resolves and executes an already fetched opcode. The program counter is expected to
    /// already point past it.
    pub fn step(&mut self, opcode: u16) -> Result<u8, Fault> {
        let addr = self.pc.wrapping_sub(2) & ADDR_MASK;
        let Some(op) = lookup::fetch(opcode) else {
            self.last_instruction = LastInstruction::Invalid(opcode);
            let fault = Fault::InvalidOpcode { opcode, addr };
            error!("[INVALID INSTRUCTION] {fault}");
            return Err(fault);
        };
        self.last_instruction = LastInstruction::Executed(opcode);
        let op = match op {
            Chip8Op::JumpOffset if self.quirks.jump_uses_vx => Chip8Op::JumpOffsetVx,
            op => op,
        };
        let inst = Chip8Instruction::new(op, opcode);
        trace!("0x{addr:0>3X}: {inst}");
        self.execute(inst)
    }

    /// Executes a decoded instruction. Every instruction takes a single cycle.
    pub fn execute(&mut self, inst: Chip8Instruction) -> Result<u8, Fault> {
        let Operands { x, y, n, kk, nnn } = inst.operands;
        match inst.op {
            Chip8Op::Noop => {}
            Chip8Op::Clear => self.screen.clear(),
            Chip8Op::Return => {
                let addr = self.pc.wrapping_sub(2) & ADDR_MASK;
                let Some(ret) = self.stack.pop() else {
                    error!("Stack underflow @ 0x{addr:0>3X}");
                    return Err(Fault::StackUnderflow { addr });
                };
                self.pc = ret;
            }
            Chip8Op::Jump => self.pc = nnn,
            Chip8Op::Call => {
                let addr = self.pc.wrapping_sub(2) & ADDR_MASK;
                if self.stack.push(self.pc).is_err() {
                    error!("Stack overflow @ 0x{addr:0>3X}");
                    return Err(Fault::StackOverflow { addr });
                }
                self.pc = nnn;
            }
            Chip8Op::SkipEqualImm => self.skip_if(self.v[x] == kk),
            Chip8Op::SkipNotEqualImm => self.skip_if(self.v[x] != kk),
            Chip8Op::SkipEqualReg => self.skip_if(self.v[x] == self.v[y]),
            Chip8Op::SkipNotEqualReg => self.skip_if(self.v[x] != self.v[y]),
            Chip8Op::LoadImm => self.v[x] = kk,
            Chip8Op::AddImm => self.v[x] = self.v[x].wrapping_add(kk),
            Chip8Op::LoadReg => self.v[x] = self.v[y],
            Chip8Op::Or => self.v[x] |= self.v[y],
            Chip8Op::And => self.v[x] &= self.v[y],
            Chip8Op::Xor => self.v[x] ^= self.v[y],
            Chip8Op::AddReg => {
                let (val, carry) = self.v[x].overflowing_add(self.v[y]);
                self.set_with_flag(x, val, carry);
            }
            Chip8Op::Sub => {
                let (val, borrow) = self.v[x].overflowing_sub(self.v[y]);
                self.set_with_flag(x, val, !borrow);
            }
            Chip8Op::SubReversed => {
                let (val, borrow) = self.v[y].overflowing_sub(self.v[x]);
                self.set_with_flag(x, val, !borrow);
            }
            Chip8Op::ShiftRight => {
                let src = if self.quirks.shift_uses_vy { self.v[y] } else { self.v[x] };
                self.set_with_flag(x, src >> 1, src & 0x01 != 0);
            }
            Chip8Op::ShiftLeft => {
                let src = if self.quirks.shift_uses_vy { self.v[y] } else { self.v[x] };
                self.set_with_flag(x, src << 1, src & 0x80 != 0);
            }
            Chip8Op::LoadIndex => self.i = nnn,
            Chip8Op::JumpOffset => self.pc = nnn.wrapping_add(self.v[0] as u16) & ADDR_MASK,
            Chip8Op::JumpOffsetVx => self.pc = nnn.wrapping_add(self.v[x] as u16) & ADDR_MASK,
            Chip8Op::Random => self.v[x] = self.rng.gen::<u8>() & kk,
            Chip8Op::Draw => {
                let mut sprite = [0; 15];
                for (row, byte) in sprite.iter_mut().enumerate().take(n as usize) {
                    *byte = self.read_byte(self.i.wrapping_add(row as u16));
                }
                let collision = self.screen.draw_sprite(
                    self.v[x] as usize,
                    self.v[y] as usize,
                    &sprite[..n as usize],
                );
                self.v[0xF] = collision as u8;
            }
            Chip8Op::SkipKeyPressed => self.skip_if(self.keyboard == Some(self.v[x] & 0xF)),
            Chip8Op::SkipKeyNotPressed => self.skip_if(self.keyboard != Some(self.v[x] & 0xF)),
            Chip8Op::LoadDelay => self.v[x] = self.delay,
            Chip8Op::WaitKey => match self.keyboard.take() {
                Some(key) => self.v[x] = key,
                // Nothing pressed yet, so run this instruction again next tick
                None => self.pc = self.pc.wrapping_sub(2) & ADDR_MASK,
            },
            Chip8Op::SetDelay => self.delay = self.v[x],
            Chip8Op::SetSound => self.sound = self.v[x],
            Chip8Op::AddIndex => self.i = self.i.wrapping_add(self.v[x] as u16) & ADDR_MASK,
            Chip8Op::LoadFont => self.i = FONT_START + (self.v[x] & 0xF) as u16 * 5,
            Chip8Op::StoreBcd => {
                let val = self.v[x];
                self.write_byte(self.i, val / 100);
                self.write_byte(self.i.wrapping_add(1), (val / 10) % 10);
                self.write_byte(self.i.wrapping_add(2), val % 10);
            }
            Chip8Op::StoreRegisters => {
                for reg in 0..=x {
                    self.write_byte(self.i.wrapping_add(reg as u16), self.v[reg]);
                }
                if self.quirks.load_store_increments_i {
                    self.i = self.i.wrapping_add(x as u16 + 1) & ADDR_MASK;
                }
            }
            Chip8Op::LoadRegisters => {
                for reg in 0..=x {
                    self.v[reg] = self.read_byte(self.i.wrapping_add(reg as u16));
                }
                if self.quirks.load_store_increments_i {
                    self.i = self.i.wrapping_add(x as u16 + 1) & ADDR_MASK;
                }
            }
        }
        Ok(1)
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.pc = self.pc.wrapping_add(2) & ADDR_MASK;
        }
    }

    /// Writes the result before the flag so that the flag wins when `x` is `F`.
    fn set_with_flag(&mut self, x: usize, val: u8, flag: bool) {
        self.v[x] = val;
        self.v[0xF] = flag as u8;
    }
}

impl Emulator for Chip8 {
    fn info(&self) -> EmulationInfo {
        EmulationInfo {
            name: "CHIP-8",
            display_width: SCREEN_WIDTH,
            display_height: SCREEN_HEIGHT,
            scale: 10,
        }
    }

    fn load_rom(&mut self, rom: &[u8]) -> Result<usize, LoadError> {
        if rom.is_empty() {
            return Err(LoadError::Empty);
        }
        if rom.len() > MAX_PROGRAM_SIZE {
            return Err(LoadError::TooLarge {
                len: rom.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        self.reset();
        let start = PROGRAM_START as usize;
        self.memory[start..start + rom.len()].copy_from_slice(rom);
        debug!("Loaded {} byte CHIP-8 program", rom.len());
        trace!("\n{}", HexDump(rom));
        Ok(rom.len())
    }

    fn tick(&mut self) -> u8 {
        if self.state.is_halted() {
            return 0;
        }
        let opcode = self.read_word(self.pc);
        self.pc = self.pc.wrapping_add(2) & ADDR_MASK;
        match self.step(opcode) {
            Ok(cycles) => cycles,
            Err(fault) => {
                self.state = RunState::Halted(fault);
                0
            }
        }
    }

    fn set_keyboard_value(&mut self, key: u8) {
        if key > 0xF {
            warn!("Ignoring key 0x{key:0>2X}, CHIP-8 keys are 0x0 through 0xF");
            return;
        }
        self.keyboard = Some(key);
    }

    fn release_key(&mut self) {
        self.keyboard = None;
    }

    /// Decrements both timers. Hosts should call this at 60 Hz.
    fn tick_timers(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    fn last_instruction(&self) -> LastInstruction {
        self.last_instruction
    }

    fn display(&self) -> &[u8] {
        self.screen.pixels()
    }

    fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    fn resume(&mut self) {
        self.state = RunState::Running;
    }
}

impl fmt::Display for Chip8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CHIP-8 {{ ")?;
        for (i, v) in self.v.iter().enumerate() {
            write!(f, "V{i:X}=0x{v:0>2X} ")?;
        }
        write!(
            f,
            "I=0x{:0>3X} PC=0x{:0>3X} SP={} DT={} ST={} }}",
            self.i,
            self.pc,
            self.stack.len(),
            self.delay,
            self.sound
        )
    }
}
