//! Game Boy instruction kinds and operand decoding.
//!
//! An opcode table record selects a [`GbOp`] (or a [`CbOp`] for opcodes behind the `0xCB` prefix).
//! The operands are then pulled out of the same opcode byte by [`Fields`]. Immediate operands are
//! not part of the opcode and are read by the handlers as they execute.

use super::registers::{Flags, HalfRegister, RegisterPair};

/// The kinds of unprefixed instructions.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum GbOp {
    /// Op Code: 0x00
    #[display("NOP")]
    Noop,
    /// Op Code: 0x10
    /// Two bytes long, the second is ignored.
    #[display("STOP")]
    Stop,
    /// Op Code: 0x76
    /// Shares its encoding with `LD (HL), (HL)`, so it must be matched first.
    #[display("HALT")]
    Halt,
    /// Op Code: 0xF3
    #[display("DI")]
    Di,
    /// Op Code: 0xFB
    #[display("EI")]
    Ei,
    /// Op Code: 0xCB
    #[display("PREFIX CB")]
    Prefix,
    /// Op Codes: 0x40-0x7F, except 0x76
    #[display("LD r, r'")]
    LoadRegReg,
    /// Op Codes: 0x06, 0x0E, 0x16, 0x1E, 0x26, 0x2E, 0x36, 0x3E
    #[display("LD r, n")]
    LoadRegImm,
    /// Op Codes: 0x01, 0x11, 0x21, 0x31
    #[display("LD rr, nn")]
    LoadWideImm,
    /// Op Code: 0x08
    #[display("LD (nn), SP")]
    StoreSp,
    /// Op Code: 0xF9
    #[display("LD SP, HL")]
    LoadSpHl,
    /// Op Code: 0xF8
    #[display("LD HL, SP+e")]
    LoadHlSpOffset,
    /// Op Codes: 0xC5, 0xD5, 0xE5, 0xF5
    #[display("PUSH rr")]
    Push,
    /// Op Codes: 0xC1, 0xD1, 0xE1, 0xF1
    #[display("POP rr")]
    Pop,
    /// Op Codes: 0x02, 0x12, 0x22, 0x32
    #[display("LD (rr), A")]
    StoreAIndirect,
    /// Op Codes: 0x0A, 0x1A, 0x2A, 0x3A
    #[display("LD A, (rr)")]
    LoadAIndirect,
    /// Op Code: 0xEA
    #[display("LD (nn), A")]
    StoreADirect,
    /// Op Code: 0xFA
    #[display("LD A, (nn)")]
    LoadADirect,
    /// Op Code: 0xE0
    #[display("LDH (n), A")]
    StoreHighImm,
    /// Op Code: 0xF0
    #[display("LDH A, (n)")]
    LoadHighImm,
    /// Op Code: 0xE2
    #[display("LD (C), A")]
    StoreHighC,
    /// Op Code: 0xF2
    #[display("LD A, (C)")]
    LoadHighC,
    /// Op Codes: 0x80-0xBF
    #[display("ALU A, r")]
    AluReg,
    /// Op Codes: 0xC6, 0xCE, 0xD6, 0xDE, 0xE6, 0xEE, 0xF6, 0xFE
    #[display("ALU A, n")]
    AluImm,
    /// Op Codes: 0x04, 0x0C, 0x14, 0x1C, 0x24, 0x2C, 0x34, 0x3C
    #[display("INC r")]
    IncReg,
    /// Op Codes: 0x05, 0x0D, 0x15, 0x1D, 0x25, 0x2D, 0x35, 0x3D
    #[display("DEC r")]
    DecReg,
    /// Op Codes: 0x03, 0x13, 0x23, 0x33
    #[display("INC rr")]
    IncWide,
    /// Op Codes: 0x0B, 0x1B, 0x2B, 0x3B
    #[display("DEC rr")]
    DecWide,
    /// Op Codes: 0x09, 0x19, 0x29, 0x39
    #[display("ADD HL, rr")]
    AddHlWide,
    /// Op Code: 0xE8
    #[display("ADD SP, e")]
    AddSpOffset,
    /// Op Code: 0x27
    #[display("DAA")]
    Daa,
    /// Op Code: 0x2F
    #[display("CPL")]
    Cpl,
    /// Op Code: 0x37
    #[display("SCF")]
    Scf,
    /// Op Code: 0x3F
    #[display("CCF")]
    Ccf,
    /// Op Code: 0x07
    #[display("RLCA")]
    Rlca,
    /// Op Code: 0x0F
    #[display("RRCA")]
    Rrca,
    /// Op Code: 0x17
    #[display("RLA")]
    Rla,
    /// Op Code: 0x1F
    #[display("RRA")]
    Rra,
    /// Op Code: 0xC3
    #[display("JP nn")]
    JumpImm,
    /// Op Codes: 0xC2, 0xCA, 0xD2, 0xDA
    #[display("JP cc, nn")]
    JumpCond,
    /// Op Code: 0xE9
    #[display("JP HL")]
    JumpHl,
    /// Op Code: 0x18
    #[display("JR e")]
    JumpRel,
    /// Op Codes: 0x20, 0x28, 0x30, 0x38
    #[display("JR cc, e")]
    JumpRelCond,
    /// Op Code: 0xCD
    #[display("CALL nn")]
    Call,
    /// Op Codes: 0xC4, 0xCC, 0xD4, 0xDC
    #[display("CALL cc, nn")]
    CallCond,
    /// Op Code: 0xC9
    #[display("RET")]
    Ret,
    /// Op Codes: 0xC0, 0xC8, 0xD0, 0xD8
    #[display("RET cc")]
    RetCond,
    /// Op Code: 0xD9
    #[display("RETI")]
    Reti,
    /// Op Codes: 0xC7, 0xCF, 0xD7, 0xDF, 0xE7, 0xEF, 0xF7, 0xFF
    #[display("RST n")]
    Rst,
}

/// The kinds of instructions behind the `0xCB` prefix.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum CbOp {
    /// Op Codes: 0x00-0x07
    #[display("RLC r")]
    Rlc,
    /// Op Codes: 0x08-0x0F
    #[display("RRC r")]
    Rrc,
    /// Op Codes: 0x10-0x17
    #[display("RL r")]
    Rl,
    /// Op Codes: 0x18-0x1F
    #[display("RR r")]
    Rr,
    /// Op Codes: 0x20-0x27
    #[display("SLA r")]
    Sla,
    /// Op Codes: 0x28-0x2F
    #[display("SRA r")]
    Sra,
    /// Op Codes: 0x30-0x37
    #[display("SWAP r")]
    Swap,
    /// Op Codes: 0x38-0x3F
    #[display("SRL r")]
    Srl,
    /// Op Codes: 0x40-0x7F
    #[display("BIT b, r")]
    Bit,
    /// Op Codes: 0x80-0xBF
    #[display("RES b, r")]
    Res,
    /// Op Codes: 0xC0-0xFF
    #[display("SET b, r")]
    Set,
}

/// An 8-bit operand: either a register or the byte that `HL` points to.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::From, derive_more::IsVariant, derive_more::Display,
)]
pub enum RegOrPointer {
    #[display("{_0}")]
    Reg(HalfRegister),
    #[display("(HL)")]
    Pointer,
}

impl RegOrPointer {
    /// Decodes a three bit register field: `B, C, D, E, H, L, (HL), A`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => RegOrPointer::Reg(HalfRegister::B),
            1 => RegOrPointer::Reg(HalfRegister::C),
            2 => RegOrPointer::Reg(HalfRegister::D),
            3 => RegOrPointer::Reg(HalfRegister::E),
            4 => RegOrPointer::Reg(HalfRegister::H),
            5 => RegOrPointer::Reg(HalfRegister::L),
            6 => RegOrPointer::Pointer,
            _ => RegOrPointer::Reg(HalfRegister::A),
        }
    }
}

/// The 16-bit operands of the arithmetic and load instructions.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum WideReg {
    BC,
    DE,
    HL,
    SP,
}

impl WideReg {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => WideReg::BC,
            1 => WideReg::DE,
            2 => WideReg::HL,
            _ => WideReg::SP,
        }
    }
}

/// The pointer used by `LD (rr), A` and `LD A, (rr)`. The `HL` variants move `HL` afterwards.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum IndirectA {
    #[display("BC")]
    BC,
    #[display("DE")]
    DE,
    #[display("HL+")]
    Hli,
    #[display("HL-")]
    Hld,
}

impl IndirectA {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => IndirectA::BC,
            1 => IndirectA::DE,
            2 => IndirectA::Hli,
            _ => IndirectA::Hld,
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum Condition {
    #[display("NZ")]
    NotZero,
    #[display("Z")]
    Zero,
    #[display("NC")]
    NotCarry,
    #[display("C")]
    Carry,
}

impl Condition {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Condition::NotZero,
            1 => Condition::Zero,
            2 => Condition::NotCarry,
            _ => Condition::Carry,
        }
    }

    pub const fn passed(&self, flags: Flags) -> bool {
        match self {
            Condition::NotZero => !flags.z,
            Condition::Zero => flags.z,
            Condition::NotCarry => !flags.c,
            Condition::Carry => flags.c,
        }
    }
}

/// The eight accumulator operations, selected by bits 3-5 of `0x80-0xBF` and `0xC6-0xFE`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum AluOp {
    #[display("ADD")]
    Add,
    #[display("ADC")]
    Adc,
    #[display("SUB")]
    Sub,
    #[display("SBC")]
    Sbc,
    #[display("AND")]
    And,
    #[display("XOR")]
    Xor,
    #[display("OR")]
    Or,
    #[display("CP")]
    Cp,
}

impl AluOp {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }
}

/// The operand fields of an opcode byte. All fields are extracted regardless of whether the
/// instruction uses them.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Fields {
    pub opcode: u8,
    /// Bits 3-5. The destination register, ALU operation, bit index, or restart vector.
    pub dst: u8,
    /// Bits 0-2. The source register.
    pub src: u8,
    /// Bits 4-5. The register pair.
    pub pair: u8,
    /// Bits 3-4. The jump condition.
    pub cond: u8,
}

impl Fields {
    pub const fn decode(opcode: u8) -> Self {
        Self {
            opcode,
            dst: (opcode >> 3) & 0x07,
            src: opcode & 0x07,
            pair: (opcode >> 4) & 0x03,
            cond: (opcode >> 3) & 0x03,
        }
    }

    pub const fn dst_reg(&self) -> RegOrPointer {
        RegOrPointer::from_bits(self.dst)
    }

    pub const fn src_reg(&self) -> RegOrPointer {
        RegOrPointer::from_bits(self.src)
    }

    pub const fn wide(&self) -> WideReg {
        WideReg::from_bits(self.pair)
    }

    /// The register pair for `PUSH` and `POP`, where `AF` takes the place of `SP`.
    pub const fn stack_pair(&self) -> RegisterPair {
        match self.pair {
            0 => RegisterPair::BC,
            1 => RegisterPair::DE,
            2 => RegisterPair::HL,
            _ => RegisterPair::AF,
        }
    }

    pub const fn indirect(&self) -> IndirectA {
        IndirectA::from_bits(self.pair)
    }

    pub const fn condition(&self) -> Condition {
        Condition::from_bits(self.cond)
    }

    pub const fn alu(&self) -> AluOp {
        AluOp::from_bits(self.dst)
    }

    /// The bit index of `BIT`, `RES`, and `SET`.
    pub const fn bit(&self) -> u8 {
        self.dst
    }

    /// The target address of `RST`.
    pub const fn rst_vector(&self) -> u16 {
        (self.opcode & 0x38) as u16
    }
}
