//! The host facing surface of the crate.
//!
//! A [`Session`] owns at most one running machine. Hosts create one, install a machine (or let
//! [`Session::initialize`] do it), load a program, and then tick it forward at whatever pace they
//! like. There is no process-wide state, so multiple sessions can run side by side.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{chip8::Chip8, config::Config, gameboy::GameBoy, LoadError};

/// The architectures this crate can emulate.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    #[display("CHIP-8")]
    Chip8,
    #[display("Game Boy")]
    GameBoy,
}

/// Static facts about a machine that a host needs to present it.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{name} ({display_width}x{display_height} @ {scale}x)")]
pub struct EmulationInfo {
    pub name: &'static str,
    pub display_width: usize,
    pub display_height: usize,
    /// The suggested integer scale factor for a window.
    pub scale: usize,
}

/// The opcode a machine most recently fetched.
#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
pub enum LastInstruction {
    /// Nothing has been fetched since power on.
    #[default]
    Nothing,
    /// The opcode resolved and was executed. Prefixed Game Boy opcodes are stored with their
    /// prefix in the high byte.
    Executed(u16),
    /// The opcode did not resolve against the opcode table.
    Invalid(u16),
}

impl LastInstruction {
    pub fn opcode(&self) -> Option<u16> {
        match self {
            LastInstruction::Nothing => None,
            LastInstruction::Executed(op) | LastInstruction::Invalid(op) => Some(*op),
        }
    }
}

/// The operations every core supports.
pub trait Emulator {
    fn info(&self) -> EmulationInfo;

    /// Copies a program image into memory at the machine's load address and resets the program
    /// counter. Returns the number of bytes loaded.
    fn load_rom(&mut self, rom: &[u8]) -> Result<usize, LoadError>;

    /// Reads a program image from disk and loads it with [`Emulator::load_rom`].
    fn load_program(&mut self, path: &Path) -> Result<usize, LoadError> {
        let rom = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_rom(&rom)
    }

    /// Executes exactly one instruction and returns how many cycles it took. Zero means the
    /// machine has stopped, either because of a halting instruction or because it encountered an
    /// opcode it does not understand.
    fn tick(&mut self) -> u8;

    /// Latches the most recently pressed key.
    fn set_keyboard_value(&mut self, key: u8);

    /// Clears the latched key, so that no key reads as pressed.
    fn release_key(&mut self);

    /// Advances the machine's countdown timers by one step. Hosts call this at 60 Hz, independent
    /// of how fast they tick.
    fn tick_timers(&mut self);

    fn last_instruction(&self) -> LastInstruction;

    /// The display buffer, one byte per pixel, row major.
    fn display(&self) -> &[u8];

    fn is_halted(&self) -> bool;

    /// Clears a halt so that ticking resumes. This is the host intervention a halted machine
    /// waits for.
    fn resume(&mut self);
}

/// Holds the active machine. All operations are no-ops (or return zero) when no machine is
/// installed.
#[derive(Default)]
pub struct Session {
    context: Option<Box<dyn Emulator>>,
}

impl Session {
    /// Constructs an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a session with a freshly powered on machine of the given architecture.
    pub fn initialize(arch: Architecture, config: &Config) -> Self {
        let machine: Box<dyn Emulator> = match arch {
            Architecture::Chip8 => Box::new(Chip8::new(&config.chip8)),
            Architecture::GameBoy => Box::new(GameBoy::new(&config.gameboy)),
        };
        debug!("Initialized {arch} session");
        Self {
            context: Some(machine),
        }
    }

    /// Installs a machine as the active context, returning the previous one.
    pub fn set_emulation_context(
        &mut self,
        machine: Box<dyn Emulator>,
    ) -> Option<Box<dyn Emulator>> {
        self.context.replace(machine)
    }

    pub fn context(&self) -> Option<&dyn Emulator> {
        self.context.as_deref()
    }

    pub fn context_mut(&mut self) -> Option<&mut (dyn Emulator + 'static)> {
        self.context.as_deref_mut()
    }

    /// Loads a program from disk into the active machine. Returns the number of bytes loaded, or
    /// zero if loading failed.
    pub fn load_program(&mut self, path: impl AsRef<Path>) -> usize {
        let Some(machine) = self.context.as_mut() else {
            warn!("Tried to load a program without an active context");
            return 0;
        };
        match machine.load_program(path.as_ref()) {
            Ok(len) => len,
            Err(err) => {
                error!("{err}");
                0
            }
        }
    }

    /// Ticks the active machine once. Returns zero if there is no active machine.
    pub fn tick_emulation(&mut self) -> u8 {
        self.context.as_mut().map_or(0, |machine| machine.tick())
    }

    pub fn set_keyboard_value(&mut self, key: u8) {
        if let Some(machine) = self.context.as_mut() {
            machine.set_keyboard_value(key);
        }
    }

    pub fn release_key(&mut self) {
        if let Some(machine) = self.context.as_mut() {
            machine.release_key();
        }
    }

    pub fn tick_timers(&mut self) {
        if let Some(machine) = self.context.as_mut() {
            machine.tick_timers();
        }
    }

    /// Releases the active machine. Safe to call on an empty session.
    pub fn quit_program(&mut self) {
        if self.context.take().is_some() {
            debug!("Released emulation context");
        }
    }

    pub fn is_active(&self) -> bool {
        self.context.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_session_is_inert() {
        let mut session = Session::new();
        assert_eq!(session.tick_emulation(), 0);
        assert_eq!(session.load_program("does/not/exist.ch8"), 0);
        session.set_keyboard_value(3);
        session.release_key();
        session.tick_timers();
        session.quit_program();
        session.quit_program();
        assert!(!session.is_active());
    }

    #[test]
    fn last_instruction_opcode() {
        assert_eq!(LastInstruction::Nothing.opcode(), None);
        assert_eq!(LastInstruction::Executed(0x6A12).opcode(), Some(0x6A12));
        assert!(LastInstruction::Invalid(0xFFFF).is_invalid());
    }
}
