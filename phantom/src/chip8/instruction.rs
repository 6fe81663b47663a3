use std::fmt;

/// The kinds of CHIP-8 instructions. Each kind is selected by one record in the opcode table, and
/// its operands are decoded separately (see [`Operands`]).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum Chip8Op {
    /// Op Code: 0x0000
    /// Does nothing. Zeroed memory decodes to this.
    #[display("NOP")]
    Noop,
    /// Op Code: 0x00E0
    #[display("CLS")]
    Clear,
    /// Op Code: 0x00EE
    #[display("RET")]
    Return,
    /// Op Code: 0x1nnn
    #[display("JP addr")]
    Jump,
    /// Op Code: 0x2nnn
    #[display("CALL addr")]
    Call,
    /// Op Code: 0x3xkk
    #[display("SE Vx, byte")]
    SkipEqualImm,
    /// Op Code: 0x4xkk
    #[display("SNE Vx, byte")]
    SkipNotEqualImm,
    /// Op Code: 0x5xy0
    #[display("SE Vx, Vy")]
    SkipEqualReg,
    /// Op Code: 0x6xkk
    #[display("LD Vx, byte")]
    LoadImm,
    /// Op Code: 0x7xkk
    /// Does not touch VF.
    #[display("ADD Vx, byte")]
    AddImm,
    /// Op Code: 0x8xy0
    #[display("LD Vx, Vy")]
    LoadReg,
    /// Op Code: 0x8xy1
    #[display("OR Vx, Vy")]
    Or,
    /// Op Code: 0x8xy2
    #[display("AND Vx, Vy")]
    And,
    /// Op Code: 0x8xy3
    #[display("XOR Vx, Vy")]
    Xor,
    /// Op Code: 0x8xy4
    /// VF is set to the carry.
    #[display("ADD Vx, Vy")]
    AddReg,
    /// Op Code: 0x8xy5
    /// VF is set when there is no borrow.
    #[display("SUB Vx, Vy")]
    Sub,
    /// Op Code: 0x8xy6
    #[display("SHR Vx, Vy")]
    ShiftRight,
    /// Op Code: 0x8xy7
    /// Vx = Vy - Vx, VF is set when there is no borrow.
    #[display("SUBN Vx, Vy")]
    SubReversed,
    /// Op Code: 0x8xyE
    #[display("SHL Vx, Vy")]
    ShiftLeft,
    /// Op Code: 0x9xy0
    #[display("SNE Vx, Vy")]
    SkipNotEqualReg,
    /// Op Code: 0xAnnn
    #[display("LD I, addr")]
    LoadIndex,
    /// Op Code: 0xBnnn
    #[display("JP V0, addr")]
    JumpOffset,
    /// Op Code: 0xBxnn
    /// The same opcode as [`Chip8Op::JumpOffset`], on machines that jump relative to `Vx`. The
    /// opcode table never produces this; the core swaps it in when the quirk is enabled.
    #[display("JP Vx, addr")]
    JumpOffsetVx,
    /// Op Code: 0xCxkk
    #[display("RND Vx, byte")]
    Random,
    /// Op Code: 0xDxyn
    #[display("DRW Vx, Vy, nibble")]
    Draw,
    /// Op Code: 0xEx9E
    #[display("SKP Vx")]
    SkipKeyPressed,
    /// Op Code: 0xExA1
    #[display("SKNP Vx")]
    SkipKeyNotPressed,
    /// Op Code: 0xFx07
    #[display("LD Vx, DT")]
    LoadDelay,
    /// Op Code: 0xFx0A
    #[display("LD Vx, K")]
    WaitKey,
    /// Op Code: 0xFx15
    #[display("LD DT, Vx")]
    SetDelay,
    /// Op Code: 0xFx18
    #[display("LD ST, Vx")]
    SetSound,
    /// Op Code: 0xFx1E
    #[display("ADD I, Vx")]
    AddIndex,
    /// Op Code: 0xFx29
    #[display("LD F, Vx")]
    LoadFont,
    /// Op Code: 0xFx33
    #[display("LD B, Vx")]
    StoreBcd,
    /// Op Code: 0xFx55
    #[display("LD [I], Vx")]
    StoreRegisters,
    /// Op Code: 0xFx65
    #[display("LD Vx, [I]")]
    LoadRegisters,
}

/// The operand fields of a CHIP-8 opcode. Every field is extracted regardless of whether the
/// instruction uses it.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Operands {
    /// Bits 8-11.
    pub x: usize,
    /// Bits 4-7.
    pub y: usize,
    /// Bits 0-3.
    pub n: u8,
    /// Bits 0-7.
    pub kk: u8,
    /// Bits 0-11.
    pub nnn: u16,
}

impl Operands {
    pub const fn decode(opcode: u16) -> Self {
        Self {
            x: ((opcode >> 8) & 0xF) as usize,
            y: ((opcode >> 4) & 0xF) as usize,
            n: (opcode & 0xF) as u8,
            kk: (opcode & 0xFF) as u8,
            nnn: opcode & 0xFFF,
        }
    }
}

/// A resolved and decoded instruction. Its `Display` impl is a disassembly of the opcode.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Chip8Instruction {
    pub op: Chip8Op,
    pub operands: Operands,
}

impl Chip8Instruction {
    pub const fn new(op: Chip8Op, opcode: u16) -> Self {
        Self {
            op,
            operands: Operands::decode(opcode),
        }
    }
}

impl fmt::Display for Chip8Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Operands { x, y, n, kk, nnn } = self.operands;
        match self.op {
            Chip8Op::Noop => write!(f, "NOP"),
            Chip8Op::Clear => write!(f, "CLS"),
            Chip8Op::Return => write!(f, "RET"),
            Chip8Op::Jump => write!(f, "JP 0x{nnn:0>3X}"),
            Chip8Op::Call => write!(f, "CALL 0x{nnn:0>3X}"),
            Chip8Op::SkipEqualImm => write!(f, "SE V{x:X}, 0x{kk:0>2X}"),
            Chip8Op::SkipNotEqualImm => write!(f, "SNE V{x:X}, 0x{kk:0>2X}"),
            Chip8Op::SkipEqualReg => write!(f, "SE V{x:X}, V{y:X}"),
            Chip8Op::LoadImm => write!(f, "LD V{x:X}, 0x{kk:0>2X}"),
            Chip8Op::AddImm => write!(f, "ADD V{x:X}, 0x{kk:0>2X}"),
            Chip8Op::LoadReg => write!(f, "LD V{x:X}, V{y:X}"),
            Chip8Op::Or => write!(f, "OR V{x:X}, V{y:X}"),
            Chip8Op::And => write!(f, "AND V{x:X}, V{y:X}"),
            Chip8Op::Xor => write!(f, "XOR V{x:X}, V{y:X}"),
            Chip8Op::AddReg => write!(f, "ADD V{x:X}, V{y:X}"),
            Chip8Op::Sub => write!(f, "SUB V{x:X}, V{y:X}"),
            Chip8Op::ShiftRight => write!(f, "SHR V{x:X}, V{y:X}"),
            Chip8Op::SubReversed => write!(f, "SUBN V{x:X}, V{y:X}"),
            Chip8Op::ShiftLeft => write!(f, "SHL V{x:X}, V{y:X}"),
            Chip8Op::SkipNotEqualReg => write!(f, "SNE V{x:X}, V{y:X}"),
            Chip8Op::LoadIndex => write!(f, "LD I, 0x{nnn:0>3X}"),
            Chip8Op::JumpOffset => write!(f, "JP V0, 0x{nnn:0>3X}"),
            Chip8Op::JumpOffsetVx => write!(f, "JP V{x:X}, 0x{nnn:0>3X}"),
            Chip8Op::Random => write!(f, "RND V{x:X}, 0x{kk:0>2X}"),
            Chip8Op::Draw => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            Chip8Op::SkipKeyPressed => write!(f, "SKP V{x:X}"),
            Chip8Op::SkipKeyNotPressed => write!(f, "SKNP V{x:X}"),
            Chip8Op::LoadDelay => write!(f, "LD V{x:X}, DT"),
            Chip8Op::WaitKey => write!(f, "LD V{x:X}, K"),
            Chip8Op::SetDelay => write!(f, "LD DT, V{x:X}"),
            Chip8Op::SetSound => write!(f, "LD ST, V{x:X}"),
            Chip8Op::AddIndex => write!(f, "ADD I, V{x:X}"),
            Chip8Op::LoadFont => write!(f, "LD F, V{x:X}"),
            Chip8Op::StoreBcd => write!(f, "LD B, V{x:X}"),
            Chip8Op::StoreRegisters => write!(f, "LD [I], V{x:X}"),
            Chip8Op::LoadRegisters => write!(f, "LD V{x:X}, [I]"),
        }
    }
}
