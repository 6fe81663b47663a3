//! The CHIP-8 opcode table.
//!
//! Every entry carries the mask of the bits that identify its instruction, so no two entries can
//! match the same opcode and the scan order only matters for speed. Bits outside of an entry's
//! mask are operands.

use std::sync::LazyLock;

use crate::dispatch::OpcodeTable;

use super::instruction::Chip8Op;

pub static OPCODE_TABLE: LazyLock<OpcodeTable<Chip8Op>> = LazyLock::new(build_table);

/// Resolves a raw opcode against [`OPCODE_TABLE`].
pub fn fetch(opcode: u16) -> Option<Chip8Op> {
    OPCODE_TABLE.fetch(opcode)
}

pub fn build_table() -> OpcodeTable<Chip8Op> {
    OpcodeTable::builder()
        .entry(0xFFFF, 0x0000, Chip8Op::Noop)
        .entry(0xFFFF, 0x00E0, Chip8Op::Clear)
        .entry(0xFFFF, 0x00EE, Chip8Op::Return)
        .entry(0xF000, 0x1000, Chip8Op::Jump)
        .entry(0xF000, 0x2000, Chip8Op::Call)
        .entry(0xF000, 0x3000, Chip8Op::SkipEqualImm)
        .entry(0xF000, 0x4000, Chip8Op::SkipNotEqualImm)
        .entry(0xF00F, 0x5000, Chip8Op::SkipEqualReg)
        .entry(0xF000, 0x6000, Chip8Op::LoadImm)
        .entry(0xF000, 0x7000, Chip8Op::AddImm)
        .entry(0xF00F, 0x8000, Chip8Op::LoadReg)
        .entry(0xF00F, 0x8001, Chip8Op::Or)
        .entry(0xF00F, 0x8002, Chip8Op::And)
        .entry(0xF00F, 0x8003, Chip8Op::Xor)
        .entry(0xF00F, 0x8004, Chip8Op::AddReg)
        .entry(0xF00F, 0x8005, Chip8Op::Sub)
        .entry(0xF00F, 0x8006, Chip8Op::ShiftRight)
        .entry(0xF00F, 0x8007, Chip8Op::SubReversed)
        .entry(0xF00F, 0x800E, Chip8Op::ShiftLeft)
        .entry(0xF00F, 0x9000, Chip8Op::SkipNotEqualReg)
        .entry(0xF000, 0xA000, Chip8Op::LoadIndex)
        .entry(0xF000, 0xB000, Chip8Op::JumpOffset)
        .entry(0xF000, 0xC000, Chip8Op::Random)
        .entry(0xF000, 0xD000, Chip8Op::Draw)
        .entry(0xF0FF, 0xE09E, Chip8Op::SkipKeyPressed)
        .entry(0xF0FF, 0xE0A1, Chip8Op::SkipKeyNotPressed)
        .entry(0xF0FF, 0xF007, Chip8Op::LoadDelay)
        .entry(0xF0FF, 0xF00A, Chip8Op::WaitKey)
        .entry(0xF0FF, 0xF015, Chip8Op::SetDelay)
        .entry(0xF0FF, 0xF018, Chip8Op::SetSound)
        .entry(0xF0FF, 0xF01E, Chip8Op::AddIndex)
        .entry(0xF0FF, 0xF029, Chip8Op::LoadFont)
        .entry(0xF0FF, 0xF033, Chip8Op::StoreBcd)
        .entry(0xF0FF, 0xF055, Chip8Op::StoreRegisters)
        .entry(0xF0FF, 0xF065, Chip8Op::LoadRegisters)
        .build()
}
