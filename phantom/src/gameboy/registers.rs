//! The Game Boy register file.
//!
//! All eight 8-bit registers live in one byte array. Each 16-bit pair is a view over two slots,
//! with the first named register as the high byte (`BC` is `B << 8 | C`). The slots are laid out so
//! that every pair is two adjacent bytes in little endian order:
//!
//! | slot | 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7 |
//! |------|---|---|---|---|---|---|---|---|
//! | reg  | C | B | E | D | L | H | F | A |

use std::{fmt, ops::Index};

use serde::{Deserialize, Serialize};

use crate::utils::{bool_to_mask, check_bit_const};

/// One of the 8-bit registers.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum HalfRegister {
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl HalfRegister {
    /// The register's slot in [`Registers`].
    pub const fn slot(self) -> usize {
        match self {
            HalfRegister::C => 0,
            HalfRegister::B => 1,
            HalfRegister::E => 2,
            HalfRegister::D => 3,
            HalfRegister::L => 4,
            HalfRegister::H => 5,
            HalfRegister::F => 6,
            HalfRegister::A => 7,
        }
    }
}

/// The 16-bit views over the register file. `SP` is not part of the file.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum RegisterPair {
    AF,
    BC,
    DE,
    HL,
}

impl RegisterPair {
    /// The `(low, high)` registers that make up this pair.
    pub const fn halves(self) -> (HalfRegister, HalfRegister) {
        match self {
            RegisterPair::AF => (HalfRegister::F, HalfRegister::A),
            RegisterPair::BC => (HalfRegister::C, HalfRegister::B),
            RegisterPair::DE => (HalfRegister::E, HalfRegister::D),
            RegisterPair::HL => (HalfRegister::L, HalfRegister::H),
        }
    }
}

/// Combines two bytes into a word, `low` being the least significant byte.
pub const fn pair(low: u8, high: u8) -> u16 {
    u16::from_le_bytes([low, high])
}

#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    file: [u8; 8],
}

impl Registers {
    pub fn get(&self, reg: HalfRegister) -> u8 {
        self.file[reg.slot()]
    }

    /// Writes a register. The low nibble of `F` does not exist and always reads back as `0`.
    pub fn set(&mut self, reg: HalfRegister, val: u8) {
        let val = match reg {
            HalfRegister::F => val & 0xF0,
            _ => val,
        };
        self.file[reg.slot()] = val;
    }

    pub fn wide(&self, reg: RegisterPair) -> u16 {
        let (low, high) = reg.halves();
        pair(self.get(low), self.get(high))
    }

    pub fn set_wide(&mut self, reg: RegisterPair, val: u16) {
        let (low, high) = reg.halves();
        let [lo, hi] = val.to_le_bytes();
        self.set(low, lo);
        self.set(high, hi);
    }

    pub fn flags(&self) -> Flags {
        self.get(HalfRegister::F).into()
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.set(HalfRegister::F, flags.as_byte());
    }

    /// Reads the flags, lets the closure change them, and writes them back.
    pub fn update_flags(&mut self, update: impl FnOnce(&mut Flags)) {
        let mut flags = self.flags();
        update(&mut flags);
        self.set_flags(flags);
    }
}

impl Index<HalfRegister> for Registers {
    type Output = u8;

    fn index(&self, index: HalfRegister) -> &Self::Output {
        &self.file[index.slot()]
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A=0x{:0>2X} {} B=0x{:0>2X} C=0x{:0>2X} D=0x{:0>2X} E=0x{:0>2X} H=0x{:0>2X} L=0x{:0>2X}",
            self[HalfRegister::A],
            self.flags(),
            self[HalfRegister::B],
            self[HalfRegister::C],
            self[HalfRegister::D],
            self[HalfRegister::E],
            self[HalfRegister::H],
            self[HalfRegister::L],
        )
    }
}

/// A decoded view of the `F` register.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, derive_more::Display, Serialize, Deserialize,
)]
#[display(
    "Flags(Z={} N={} H={} C={})",
    *z as u8,
    *n as u8,
    *h as u8,
    *c as u8
)]
pub struct Flags {
    /// The zero flag
    pub z: bool,
    /// The subtraction flag
    pub n: bool,
    /// The half-carry flag
    pub h: bool,
    /// The full carry flag
    pub c: bool,
}

impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self {
            z: check_bit_const::<7>(value),
            n: check_bit_const::<6>(value),
            h: check_bit_const::<5>(value),
            c: check_bit_const::<4>(value),
        }
    }
}

impl Flags {
    pub const fn new(z: bool, n: bool, h: bool, c: bool) -> Self {
        Self { z, n, h, c }
    }

    pub fn as_byte(&self) -> u8 {
        bool_to_mask::<7>(self.z)
            | bool_to_mask::<6>(self.n)
            | bool_to_mask::<5>(self.h)
            | bool_to_mask::<4>(self.c)
    }
}
