//! Phantom is the core crate for the phantom project. It contains two table-dispatched CPU cores,
//! a CHIP-8 virtual machine and a Game Boy (DMG) CPU, plus the small amount of plumbing a host
//! needs to drive either of them. This crate is free of any windowing or audio specifics. Hosts
//! wrap these cores in their own ways: a GUI blits [`Emulator::display`], a headless runner just
//! ticks until the machine halts.
//!
//! Both cores share the same shape. An opcode is read at the program counter, resolved against an
//! ordered table of `(mask, match)` patterns (see [`dispatch`]), decoded into operand fields, and
//! executed. Every tick executes exactly one instruction and returns the number of cycles it
//! took. A tick of `0` means the machine stopped, either because it hit a halting instruction or
//! because the opcode did not resolve.
//!
//! # Notes
//! CHIP-8 opcodes are stored big endian. The Game Boy CPU is little endian.

pub mod chip8;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gameboy;
pub mod session;
pub mod utils;

pub use config::Config;
pub use error::{Fault, LoadError};
pub use session::{Architecture, EmulationInfo, Emulator, LastInstruction, Session};
