//! The Game Boy opcode tables.
//!
//! Unlike CHIP-8, the Game Boy encodings overlap: `HALT` (`0x76`) sits in the middle of the
//! `LD r, r'` block. Exact patterns are inserted before the families they carve out of, and the
//! first match wins.

use std::sync::LazyLock;

use crate::dispatch::OpcodeTable;

use super::instruction::{CbOp, GbOp};

pub static OPCODE_TABLE: LazyLock<OpcodeTable<GbOp>> = LazyLock::new(build_table);

pub static PREFIXED_TABLE: LazyLock<OpcodeTable<CbOp>> = LazyLock::new(build_prefixed_table);

pub fn fetch(opcode: u8) -> Option<GbOp> {
    OPCODE_TABLE.fetch(opcode as u16)
}

pub fn fetch_prefixed(opcode: u8) -> Option<CbOp> {
    PREFIXED_TABLE.fetch(opcode as u16)
}

pub fn build_table() -> OpcodeTable<GbOp> {
    OpcodeTable::builder()
        // Control
        .entry(0xFF, 0x00, GbOp::Noop)
        .entry(0xFF, 0x10, GbOp::Stop)
        .entry(0xFF, 0x76, GbOp::Halt)
        .entry(0xFF, 0xF3, GbOp::Di)
        .entry(0xFF, 0xFB, GbOp::Ei)
        .entry(0xFF, 0xCB, GbOp::Prefix)
        // 8-bit loads
        .entry(0xC0, 0x40, GbOp::LoadRegReg)
        .entry(0xC7, 0x06, GbOp::LoadRegImm)
        .entry(0xCF, 0x02, GbOp::StoreAIndirect)
        .entry(0xCF, 0x0A, GbOp::LoadAIndirect)
        .entry(0xFF, 0xEA, GbOp::StoreADirect)
        .entry(0xFF, 0xFA, GbOp::LoadADirect)
        .entry(0xFF, 0xE0, GbOp::StoreHighImm)
        .entry(0xFF, 0xF0, GbOp::LoadHighImm)
        .entry(0xFF, 0xE2, GbOp::StoreHighC)
        .entry(0xFF, 0xF2, GbOp::LoadHighC)
        // 16-bit loads
        .entry(0xCF, 0x01, GbOp::LoadWideImm)
        .entry(0xFF, 0x08, GbOp::StoreSp)
        .entry(0xFF, 0xF9, GbOp::LoadSpHl)
        .entry(0xFF, 0xF8, GbOp::LoadHlSpOffset)
        .entry(0xCF, 0xC5, GbOp::Push)
        .entry(0xCF, 0xC1, GbOp::Pop)
        // 8-bit arithmetic
        .entry(0xC0, 0x80, GbOp::AluReg)
        .entry(0xC7, 0xC6, GbOp::AluImm)
        .entry(0xC7, 0x04, GbOp::IncReg)
        .entry(0xC7, 0x05, GbOp::DecReg)
        .entry(0xFF, 0x27, GbOp::Daa)
        .entry(0xFF, 0x2F, GbOp::Cpl)
        .entry(0xFF, 0x37, GbOp::Scf)
        .entry(0xFF, 0x3F, GbOp::Ccf)
        // 16-bit arithmetic
        .entry(0xCF, 0x03, GbOp::IncWide)
        .entry(0xCF, 0x0B, GbOp::DecWide)
        .entry(0xCF, 0x09, GbOp::AddHlWide)
        .entry(0xFF, 0xE8, GbOp::AddSpOffset)
        // Accumulator rotates
        .entry(0xFF, 0x07, GbOp::Rlca)
        .entry(0xFF, 0x0F, GbOp::Rrca)
        .entry(0xFF, 0x17, GbOp::Rla)
        .entry(0xFF, 0x1F, GbOp::Rra)
        // Control flow
        .entry(0xFF, 0xC3, GbOp::JumpImm)
        .entry(0xE7, 0xC2, GbOp::JumpCond)
        .entry(0xFF, 0xE9, GbOp::JumpHl)
        .entry(0xFF, 0x18, GbOp::JumpRel)
        .entry(0xE7, 0x20, GbOp::JumpRelCond)
        .entry(0xFF, 0xCD, GbOp::Call)
        .entry(0xE7, 0xC4, GbOp::CallCond)
        .entry(0xFF, 0xC9, GbOp::Ret)
        .entry(0xE7, 0xC0, GbOp::RetCond)
        .entry(0xFF, 0xD9, GbOp::Reti)
        .entry(0xC7, 0xC7, GbOp::Rst)
        .build()
}

pub fn build_prefixed_table() -> OpcodeTable<CbOp> {
    OpcodeTable::builder()
        .entry(0xF8, 0x00, CbOp::Rlc)
        .entry(0xF8, 0x08, CbOp::Rrc)
        .entry(0xF8, 0x10, CbOp::Rl)
        .entry(0xF8, 0x18, CbOp::Rr)
        .entry(0xF8, 0x20, CbOp::Sla)
        .entry(0xF8, 0x28, CbOp::Sra)
        .entry(0xF8, 0x30, CbOp::Swap)
        .entry(0xF8, 0x38, CbOp::Srl)
        .entry(0xC0, 0x40, CbOp::Bit)
        .entry(0xC0, 0x80, CbOp::Res)
        .entry(0xC0, 0xC0, CbOp::Set)
        .build()
}
