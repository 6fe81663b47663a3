use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use crate::{session::LastInstruction, utils::check_bit, Fault};

use super::{
    instruction::{AluOp, CbOp, Fields, GbOp, IndirectA, RegOrPointer, WideReg},
    lookup,
    mem::{MemoryLike, MemoryLikeExt},
    registers::{Flags, HalfRegister, RegisterPair, Registers},
};

#[derive(
    Debug, Default, Hash, Clone, Copy, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
pub enum CpuState {
    #[default]
    Running,
    Halted,
    Stopped,
    #[display("Faulted({_0})")]
    Faulted(Fault),
}

#[derive(Debug, Default, Hash, Clone, PartialEq, Eq, derive_more::Display, Serialize, Deserialize)]
#[display("CPU {{ {regs} SP=0x{sp:0>4X} PC=0x{pc:0>4X} IME={ime} State={state} }}")]
pub struct Cpu {
    pub regs: Registers,
    /// The SP register
    pub sp: u16,
    /// The PC register
    pub pc: u16,
    pub ime: bool,
    /// Set by `EI`. Interrupts are enabled once the next instruction starts.
    pub to_set_ime: bool,
    /// Once the CPU has halted, stopped, or faulted, ticking it does nothing until it is resumed.
    pub state: CpuState,
    pub last_instruction: LastInstruction,
}

impl Cpu {
    /// Constructs a new CPU with each register set to 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> Flags {
        self.regs.flags()
    }

    pub fn zero_flag(&self) -> bool {
        self.flags().z
    }

    pub fn subtraction_flag(&self) -> bool {
        self.flags().n
    }

    pub fn half_carry_flag(&self) -> bool {
        self.flags().h
    }

    pub fn carry_flag(&self) -> bool {
        self.flags().c
    }

    pub fn a(&self) -> u8 {
        self.regs.get(HalfRegister::A)
    }

    pub fn hl(&self) -> u16 {
        self.regs.wide(RegisterPair::HL)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, CpuState::Running)
    }

    /// Runs the instruction at PC. Returns the number of T-cycles it took, or 0 if the CPU is not
    /// running afterwards.
    pub fn tick(&mut self, mem: &mut impl MemoryLike) -> u8 {
        if !self.is_running() {
            return 0;
        }
        if std::mem::take(&mut self.to_set_ime) {
            self.ime = true;
        }
        let addr = self.pc;
        let opcode = self.fetch_byte(mem);
        match self.step(opcode, addr, mem) {
            Ok(cycles) if self.is_running() => cycles,
            Ok(_) => 0,
            Err(fault) => {
                self.state = CpuState::Faulted(fault);
                0
            }
        }
    }

    /// Resolves and executes an opcode that was read from `addr`. PC must already point past it.
    pub fn step(&mut self, opcode: u8, addr: u16, mem: &mut impl MemoryLike) -> Result<u8, Fault> {
        let Some(op) = lookup::fetch(opcode) else {
            return Err(self.invalid(opcode as u16, addr, mem));
        };
        if op == GbOp::Prefix {
            let cb = self.fetch_byte(mem);
            let opcode = u16::from_be_bytes([0xCB, cb]);
            let Some(op) = lookup::fetch_prefixed(cb) else {
                return Err(self.invalid(opcode, addr, mem));
            };
            self.last_instruction = LastInstruction::Executed(opcode);
            trace!("0x{addr:0>4X}: {op} (0x{opcode:0>4X})");
            return Ok(self.execute_prefixed(op, Fields::decode(cb), mem));
        }
        self.last_instruction = LastInstruction::Executed(opcode as u16);
        trace!("0x{addr:0>4X}: {op} (0x{opcode:0>2X})");
        Ok(self.execute(op, Fields::decode(opcode), mem))
    }

    fn invalid(&mut self, opcode: u16, addr: u16, mem: &mut impl MemoryLike) -> Fault {
        self.last_instruction = LastInstruction::Invalid(opcode);
        // Test harnesses watch the boot ROM register for a failure signal
        mem.write_byte(0xFF50, 0x01);
        let fault = Fault::InvalidOpcode { opcode, addr };
        error!("[INVALID INSTRUCTION] {fault}");
        fault
    }

    pub fn fetch_byte(&mut self, mem: &impl MemoryLike) -> u8 {
        let digest = mem.read_byte(self.pc);
        self.pc = self.pc.wrapping_add(1);
        digest
    }

    pub fn fetch_word(&mut self, mem: &impl MemoryLike) -> u16 {
        let lo = self.fetch_byte(mem);
        let hi = self.fetch_byte(mem);
        u16::from_le_bytes([lo, hi])
    }

    /// Executes an unprefixed instruction. Immediate operands are read from PC. Returns the
    /// number of T-cycles taken.
    pub fn execute(&mut self, op: GbOp, fields: Fields, mem: &mut impl MemoryLike) -> u8 {
        match op {
            GbOp::Noop => 4,
            GbOp::Stop => {
                let _ = self.fetch_byte(mem);
                self.state = CpuState::Stopped;
                4
            }
            GbOp::Halt => {
                self.state = CpuState::Halted;
                4
            }
            GbOp::Di => {
                self.ime = false;
                self.to_set_ime = false;
                4
            }
            GbOp::Ei => {
                self.to_set_ime = true;
                4
            }
            // Resolved in `step`
            GbOp::Prefix => 4,
            GbOp::LoadRegReg => {
                let (dst, src) = (fields.dst_reg(), fields.src_reg());
                let val = self.read_operand(src, mem);
                self.write_operand(dst, val, mem);
                if dst.is_pointer() || src.is_pointer() {
                    8
                } else {
                    4
                }
            }
            GbOp::LoadRegImm => {
                let dst = fields.dst_reg();
                let val = self.fetch_byte(mem);
                self.write_operand(dst, val, mem);
                if dst.is_pointer() {
                    12
                } else {
                    8
                }
            }
            GbOp::LoadWideImm => {
                let val = self.fetch_word(mem);
                self.write_wide(fields.wide(), val);
                12
            }
            GbOp::StoreSp => {
                let addr = self.fetch_word(mem);
                mem.write_word(addr, self.sp);
                20
            }
            GbOp::LoadSpHl => {
                self.sp = self.hl();
                8
            }
            GbOp::LoadHlSpOffset => {
                let e = self.fetch_byte(mem);
                let val = self.sp_offset(e);
                self.regs.set_wide(RegisterPair::HL, val);
                12
            }
            GbOp::Push => {
                let val = self.regs.wide(fields.stack_pair());
                self.push(mem, val);
                16
            }
            GbOp::Pop => {
                let val = self.pop(mem);
                self.regs.set_wide(fields.stack_pair(), val);
                12
            }
            GbOp::StoreAIndirect => {
                let addr = self.indirect_addr(fields.indirect());
                mem.write_byte(addr, self.a());
                8
            }
            GbOp::LoadAIndirect => {
                let addr = self.indirect_addr(fields.indirect());
                self.regs.set(HalfRegister::A, mem.read_byte(addr));
                8
            }
            GbOp::StoreADirect => {
                let addr = self.fetch_word(mem);
                mem.write_byte(addr, self.a());
                16
            }
            GbOp::LoadADirect => {
                let addr = self.fetch_word(mem);
                self.regs.set(HalfRegister::A, mem.read_byte(addr));
                16
            }
            GbOp::StoreHighImm => {
                let addr = 0xFF00 | self.fetch_byte(mem) as u16;
                mem.write_byte(addr, self.a());
                12
            }
            GbOp::LoadHighImm => {
                let addr = 0xFF00 | self.fetch_byte(mem) as u16;
                self.regs.set(HalfRegister::A, mem.read_byte(addr));
                12
            }
            GbOp::StoreHighC => {
                let addr = 0xFF00 | self.regs.get(HalfRegister::C) as u16;
                mem.write_byte(addr, self.a());
                8
            }
            GbOp::LoadHighC => {
                let addr = 0xFF00 | self.regs.get(HalfRegister::C) as u16;
                self.regs.set(HalfRegister::A, mem.read_byte(addr));
                8
            }
            GbOp::AluReg => {
                let src = fields.src_reg();
                let val = self.read_operand(src, mem);
                self.alu(fields.alu(), val);
                if src.is_pointer() {
                    8
                } else {
                    4
                }
            }
            GbOp::AluImm => {
                let val = self.fetch_byte(mem);
                self.alu(fields.alu(), val);
                8
            }
            GbOp::IncReg => {
                let dst = fields.dst_reg();
                let old = self.read_operand(dst, mem);
                let val = old.wrapping_add(1);
                self.write_operand(dst, val, mem);
                self.regs.update_flags(|f| {
                    f.z = val == 0;
                    f.n = false;
                    f.h = old & 0x0F == 0x0F;
                });
                if dst.is_pointer() {
                    12
                } else {
                    4
                }
            }
            GbOp::DecReg => {
                let dst = fields.dst_reg();
                let old = self.read_operand(dst, mem);
                let val = old.wrapping_sub(1);
                self.write_operand(dst, val, mem);
                self.regs.update_flags(|f| {
                    f.z = val == 0;
                    f.n = true;
                    f.h = old & 0x0F == 0x00;
                });
                if dst.is_pointer() {
                    12
                } else {
                    4
                }
            }
            GbOp::IncWide => {
                let reg = fields.wide();
                self.write_wide(reg, self.read_wide(reg).wrapping_add(1));
                8
            }
            GbOp::DecWide => {
                let reg = fields.wide();
                self.write_wide(reg, self.read_wide(reg).wrapping_sub(1));
                8
            }
            GbOp::AddHlWide => {
                let hl = self.hl();
                let val = self.read_wide(fields.wide());
                let (sum, carry) = hl.overflowing_add(val);
                self.regs.set_wide(RegisterPair::HL, sum);
                self.regs.update_flags(|f| {
                    f.n = false;
                    f.h = (hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF;
                    f.c = carry;
                });
                8
            }
            GbOp::AddSpOffset => {
                let e = self.fetch_byte(mem);
                self.sp = self.sp_offset(e);
                16
            }
            GbOp::Daa => {
                let mut flags = self.flags();
                let val = decimal_adjust(self.a(), &mut flags);
                self.regs.set(HalfRegister::A, val);
                self.regs.set_flags(flags);
                4
            }
            GbOp::Cpl => {
                self.regs.set(HalfRegister::A, !self.a());
                self.regs.update_flags(|f| {
                    f.n = true;
                    f.h = true;
                });
                4
            }
            GbOp::Scf => {
                self.regs.update_flags(|f| {
                    f.n = false;
                    f.h = false;
                    f.c = true;
                });
                4
            }
            GbOp::Ccf => {
                self.regs.update_flags(|f| {
                    f.n = false;
                    f.h = false;
                    f.c = !f.c;
                });
                4
            }
            GbOp::Rlca => self.rotate_a(CbOp::Rlc),
            GbOp::Rrca => self.rotate_a(CbOp::Rrc),
            GbOp::Rla => self.rotate_a(CbOp::Rl),
            GbOp::Rra => self.rotate_a(CbOp::Rr),
            GbOp::JumpImm => {
                self.pc = self.fetch_word(mem);
                16
            }
            GbOp::JumpCond => {
                let addr = self.fetch_word(mem);
                if fields.condition().passed(self.flags()) {
                    self.pc = addr;
                    16
                } else {
                    12
                }
            }
            GbOp::JumpHl => {
                self.pc = self.hl();
                4
            }
            GbOp::JumpRel => {
                let e = self.fetch_byte(mem) as i8;
                self.pc = self.pc.wrapping_add_signed(e as i16);
                12
            }
            GbOp::JumpRelCond => {
                let e = self.fetch_byte(mem) as i8;
                if fields.condition().passed(self.flags()) {
                    self.pc = self.pc.wrapping_add_signed(e as i16);
                    12
                } else {
                    8
                }
            }
            GbOp::Call => {
                let addr = self.fetch_word(mem);
                self.push(mem, self.pc);
                self.pc = addr;
                24
            }
            GbOp::CallCond => {
                let addr = self.fetch_word(mem);
                if fields.condition().passed(self.flags()) {
                    self.push(mem, self.pc);
                    self.pc = addr;
                    24
                } else {
                    12
                }
            }
            GbOp::Ret => {
                self.pc = self.pop(mem);
                16
            }
            GbOp::RetCond => {
                if fields.condition().passed(self.flags()) {
                    self.pc = self.pop(mem);
                    20
                } else {
                    8
                }
            }
            GbOp::Reti => {
                self.pc = self.pop(mem);
                self.ime = true;
                16
            }
            GbOp::Rst => {
                self.push(mem, self.pc);
                self.pc = fields.rst_vector();
                16
            }
        }
    }

    /// Executes an instruction from behind the `0xCB` prefix. The returned T-cycles include the
    /// prefix.
    pub fn execute_prefixed(&mut self, op: CbOp, fields: Fields, mem: &mut impl MemoryLike) -> u8 {
        let reg = fields.src_reg();
        let val = self.read_operand(reg, mem);
        match op {
            CbOp::Bit => {
                let set = check_bit(val, fields.bit());
                self.regs.update_flags(|f| {
                    f.z = !set;
                    f.n = false;
                    f.h = true;
                });
                return if reg.is_pointer() { 12 } else { 8 };
            }
            CbOp::Res => self.write_operand(reg, val & !(1 << fields.bit()), mem),
            CbOp::Set => self.write_operand(reg, val | (1 << fields.bit()), mem),
            _ => {
                let (res, carry) = shift(op, val, self.carry_flag());
                self.write_operand(reg, res, mem);
                self.regs.set_flags(Flags::new(res == 0, false, false, carry));
            }
        }
        if reg.is_pointer() {
            16
        } else {
            8
        }
    }

    /// The accumulator rotates behave like their prefixed versions, except that they always
    /// clear the zero flag.
    fn rotate_a(&mut self, op: CbOp) -> u8 {
        let (res, carry) = shift(op, self.a(), self.carry_flag());
        self.regs.set(HalfRegister::A, res);
        self.regs.set_flags(Flags::new(false, false, false, carry));
        4
    }

    fn alu(&mut self, op: AluOp, val: u8) {
        let a = self.a();
        let carry = self.carry_flag() as u8;
        let (res, flags) = match op {
            AluOp::Add => {
                let (res, c) = a.overflowing_add(val);
                let h = (a & 0x0F) + (val & 0x0F) > 0x0F;
                (res, Flags::new(res == 0, false, h, c))
            }
            AluOp::Adc => {
                let sum = a as u16 + val as u16 + carry as u16;
                let res = sum as u8;
                let h = (a & 0x0F) + (val & 0x0F) + carry > 0x0F;
                (res, Flags::new(res == 0, false, h, sum > 0xFF))
            }
            AluOp::Sub | AluOp::Cp => {
                let (res, c) = a.overflowing_sub(val);
                let h = (a & 0x0F) < (val & 0x0F);
                (res, Flags::new(res == 0, true, h, c))
            }
            AluOp::Sbc => {
                let diff = a as i16 - val as i16 - carry as i16;
                let res = diff as u8;
                let h = ((a & 0x0F) as i16) - ((val & 0x0F) as i16) - (carry as i16) < 0;
                (res, Flags::new(res == 0, true, h, diff < 0))
            }
            AluOp::And => {
                let res = a & val;
                (res, Flags::new(res == 0, false, true, false))
            }
            AluOp::Xor => {
                let res = a ^ val;
                (res, Flags::new(res == 0, false, false, false))
            }
            AluOp::Or => {
                let res = a | val;
                (res, Flags::new(res == 0, false, false, false))
            }
        };
        if op != AluOp::Cp {
            self.regs.set(HalfRegister::A, res);
        }
        self.regs.set_flags(flags);
    }

    /// Adds a signed byte to SP and sets the flags the way `ADD SP, e` and `LD HL, SP+e` do. The
    /// carries come from the unsigned addition of the low byte.
    fn sp_offset(&mut self, e: u8) -> u16 {
        let sp = self.sp;
        let h = (sp & 0x000F) + (e as u16 & 0x000F) > 0x000F;
        let c = (sp & 0x00FF) + e as u16 > 0x00FF;
        self.regs.set_flags(Flags::new(false, false, h, c));
        sp.wrapping_add_signed(e as i8 as i16)
    }

    fn indirect_addr(&mut self, ptr: IndirectA) -> u16 {
        match ptr {
            IndirectA::BC => self.regs.wide(RegisterPair::BC),
            IndirectA::DE => self.regs.wide(RegisterPair::DE),
            IndirectA::Hli => {
                let hl = self.hl();
                self.regs.set_wide(RegisterPair::HL, hl.wrapping_add(1));
                hl
            }
            IndirectA::Hld => {
                let hl = self.hl();
                self.regs.set_wide(RegisterPair::HL, hl.wrapping_sub(1));
                hl
            }
        }
    }

    pub fn read_operand(&self, reg: RegOrPointer, mem: &impl MemoryLike) -> u8 {
        match reg {
            RegOrPointer::Reg(reg) => self.regs.get(reg),
            RegOrPointer::Pointer => mem.read_byte(self.hl()),
        }
    }

    fn write_operand(&mut self, reg: RegOrPointer, val: u8, mem: &mut impl MemoryLike) {
        match reg {
            RegOrPointer::Reg(reg) => self.regs.set(reg, val),
            RegOrPointer::Pointer => mem.write_byte(self.hl(), val),
        }
    }

    pub fn read_wide(&self, reg: WideReg) -> u16 {
        match reg {
            WideReg::BC => self.regs.wide(RegisterPair::BC),
            WideReg::DE => self.regs.wide(RegisterPair::DE),
            WideReg::HL => self.regs.wide(RegisterPair::HL),
            WideReg::SP => self.sp,
        }
    }

    pub fn write_wide(&mut self, reg: WideReg, val: u16) {
        match reg {
            WideReg::BC => self.regs.set_wide(RegisterPair::BC, val),
            WideReg::DE => self.regs.set_wide(RegisterPair::DE, val),
            WideReg::HL => self.regs.set_wide(RegisterPair::HL, val),
            WideReg::SP => self.sp = val,
        }
    }

    fn push(&mut self, mem: &mut impl MemoryLike, val: u16) {
        let [hi, lo] = val.to_be_bytes();
        self.sp = self.sp.wrapping_sub(1);
        mem.write_byte(self.sp, hi);
        self.sp = self.sp.wrapping_sub(1);
        mem.write_byte(self.sp, lo);
    }

    fn pop(&mut self, mem: &impl MemoryLike) -> u16 {
        let lo = mem.read_byte(self.sp);
        self.sp = self.sp.wrapping_add(1);
        let hi = mem.read_byte(self.sp);
        self.sp = self.sp.wrapping_add(1);
        u16::from_be_bytes([hi, lo])
    }
}

/// Applies one of the prefixed rotates or shifts. Returns the result and the bit that was shifted
/// out, which becomes the new carry.
fn shift(op: CbOp, val: u8, carry: bool) -> (u8, bool) {
    let carry = carry as u8;
    match op {
        CbOp::Rlc => (val.rotate_left(1), val & 0x80 != 0),
        CbOp::Rrc => (val.rotate_right(1), val & 0x01 != 0),
        CbOp::Rl => ((val << 1) | carry, val & 0x80 != 0),
        CbOp::Rr => ((val >> 1) | (carry << 7), val & 0x01 != 0),
        CbOp::Sla => (val << 1, val & 0x80 != 0),
        CbOp::Sra => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
        CbOp::Swap => (val.rotate_left(4), false),
        CbOp::Srl => (val >> 1, val & 0x01 != 0),
        CbOp::Bit | CbOp::Res | CbOp::Set => (val, carry != 0),
    }
}

/// Decimal adjusts `a`, the binary sum or difference of two packed BCD bytes. After an addition
/// each digit that overflowed (or went past 9) gets 6 added to it; after a subtraction each digit
/// that borrowed gets 6 taken away. C is only ever set, never cleared.
fn decimal_adjust(a: u8, flags: &mut Flags) -> u8 {
    let adding = !flags.n;
    let low_fix = flags.h || (adding && a & 0x0F > 0x09);
    let high_fix = flags.c || (adding && a > 0x99);
    let correction = (low_fix as u8 * 0x06) | (high_fix as u8 * 0x60);
    let adjusted = if adding {
        a.wrapping_add(correction)
    } else {
        a.wrapping_sub(correction)
    };
    flags.c |= high_fix;
    flags.h = false;
    flags.z = adjusted == 0;
    adjusted
}
