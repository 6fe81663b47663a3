//! Knobs that change how a machine behaves. Everything here has a sensible default, so hosts only
//! need to set what they care about.

use serde::{Deserialize, Serialize};

/// The configuration for every core a [`Session`](crate::Session) can start.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chip8: Chip8Config,
    #[serde(default)]
    pub gameboy: GameBoyConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chip8Config {
    #[serde(default)]
    pub quirks: Quirks,
    /// Seed for the `RND` instruction. When unset, the generator is seeded from the OS.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

/// CHIP-8 interpreters disagree on a handful of instructions. The defaults follow the behavior
/// most modern programs expect.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quirks {
    /// `8xy6` and `8xyE` shift `Vy` into `Vx` instead of shifting `Vx` in place.
    #[serde(default)]
    pub shift_uses_vy: bool,
    /// `Fx55` and `Fx65` leave `I` pointing past the last register they touched.
    #[serde(default)]
    pub load_store_increments_i: bool,
    /// `Bnnn` jumps to `nnn + Vx` (x being the high nibble of `nnn`) instead of `nnn + V0`.
    #[serde(default)]
    pub jump_uses_vx: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameBoyConfig {
    #[serde(default)]
    pub boot: BootMode,
}

/// Where the Game Boy starts executing after power on.
#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum BootMode {
    /// Programs are raw instruction streams that start at `0x0000`.
    #[default]
    #[display("development")]
    Development,
    /// Programs are cartridges. Execution starts at the header's entry point (`0x0100`) with the
    /// registers set the way the boot ROM leaves them.
    #[display("cartridge")]
    Cartridge,
}
