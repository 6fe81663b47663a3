use crate::{session::LastInstruction, Fault};

use super::{
    cpu::{Cpu, CpuState},
    mem::{MemoryLike, MemoryLikeExt, MemoryMap},
    registers::{Flags, HalfRegister, RegisterPair},
};

const WRAM: u16 = 0xC000;

fn init(program: &[u8]) -> (Cpu, MemoryMap) {
    let mut mem = MemoryMap::new();
    mem.load_image(program);
    let mut cpu = Cpu::new();
    cpu.sp = 0xFFFE;
    (cpu, mem)
}

/// Ticks the CPU `n` times and returns the cycles each tick took.
fn run(cpu: &mut Cpu, mem: &mut MemoryMap, n: usize) -> Vec<u8> {
    (0..n).map(|_| cpu.tick(mem)).collect()
}

#[test]
fn test_ld_b_a() {
    let (mut cpu, mut mem) = init(&[0x3E, 0x42, 0x47]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [8, 4]);
    assert_eq!(cpu.regs.get(HalfRegister::B), 0x42);
    assert_eq!(cpu.a(), 0x42);
    assert_eq!(cpu.pc, 3);
    assert_eq!(cpu.last_instruction, LastInstruction::Executed(0x47));
}

#[test]
fn test_ld_pointer() {
    // LD HL, 0xC000; LD (HL), 0x99; LD B, (HL)
    let (mut cpu, mut mem) = init(&[0x21, 0x00, 0xC0, 0x36, 0x99, 0x46]);
    assert_eq!(run(&mut cpu, &mut mem, 3), [12, 12, 8]);
    assert_eq!(mem.read_byte(WRAM), 0x99);
    assert_eq!(cpu.regs.get(HalfRegister::B), 0x99);
}

#[test]
fn test_add_a_a() {
    let (mut cpu, mut mem) = init(&[0x3E, 0xFF, 0x87]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [8, 4]);
    assert_eq!(cpu.a(), 0xFE);
    assert_eq!(cpu.flags(), Flags::new(false, false, true, true), "{cpu}");
}

#[test]
fn test_add_hl_bc() {
    let (mut cpu, mut mem) = init(&[0x21, 0x34, 0x12, 0x01, 0xCD, 0xAB, 0x09]);
    assert_eq!(run(&mut cpu, &mut mem, 3), [12, 12, 8]);
    assert_eq!(cpu.hl(), 0xBE01);
    assert!(!cpu.half_carry_flag());
    assert!(!cpu.carry_flag());
    assert!(!cpu.subtraction_flag());
}

#[test]
fn test_add_hl_carries() {
    // LD HL, 0x8FFF; LD DE, 0x8001; ADD HL, DE
    let (mut cpu, mut mem) = init(&[0x21, 0xFF, 0x8F, 0x11, 0x01, 0x80, 0x19]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.hl(), 0x1000);
    assert!(cpu.half_carry_flag());
    assert!(cpu.carry_flag());
}

#[test]
fn test_push_pop() {
    // LD BC, 0x1234; PUSH BC; POP DE
    let (mut cpu, mut mem) = init(&[0x01, 0x34, 0x12, 0xC5, 0xD1]);
    assert_eq!(run(&mut cpu, &mut mem, 3), [12, 16, 12]);
    assert_eq!(cpu.regs.wide(RegisterPair::DE), 0x1234);
    assert_eq!(mem.read_byte(0xFFFD), 0x12);
    assert_eq!(mem.read_byte(0xFFFC), 0x34);
    assert_eq!(cpu.sp, 0xFFFE);
}

#[test]
fn test_pop_af_masks_flags() {
    // LD BC, 0x12FF; PUSH BC; POP AF
    let (mut cpu, mut mem) = init(&[0x01, 0xFF, 0x12, 0xC5, 0xF1]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.regs.wide(RegisterPair::AF), 0x12F0);
    assert_eq!(cpu.flags(), Flags::new(true, true, true, true));
}

#[test]
fn test_call_ret() {
    let mut program = vec![0; 0x11];
    program[..3].copy_from_slice(&[0xCD, 0x10, 0x00]);
    program[0x10] = 0xC9;
    let (mut cpu, mut mem) = init(&program);
    assert_eq!(cpu.tick(&mut mem), 24);
    assert_eq!(cpu.pc, 0x0010);
    assert_eq!(cpu.sp, 0xFFFC);
    assert_eq!(mem.read_word(cpu.sp), 0x0003);
    assert_eq!(cpu.tick(&mut mem), 16);
    assert_eq!(cpu.pc, 0x0003);
    assert_eq!(cpu.sp, 0xFFFE);
}

#[test]
fn test_conditional_calls() {
    let mut program = vec![0; 0x1001];
    // XOR A; CALL C, 0x1000; CALL NC, 0x1000
    program[..7].copy_from_slice(&[0xAF, 0xDC, 0x00, 0x10, 0xD4, 0x00, 0x10]);
    // RET NC
    program[0x1000] = 0xD0;
    let (mut cpu, mut mem) = init(&program);
    assert_eq!(run(&mut cpu, &mut mem, 2), [4, 12]);
    assert_eq!(cpu.pc, 4);
    assert_eq!(cpu.tick(&mut mem), 24);
    assert_eq!(cpu.pc, 0x1000);
    assert_eq!(cpu.tick(&mut mem), 20);
    assert_eq!(cpu.pc, 7);
    // RET C, not taken
    let (mut cpu, mut mem) = init(&[0xD8]);
    assert_eq!(cpu.tick(&mut mem), 8);
    assert_eq!(cpu.pc, 1);
}

#[test]
fn test_rst() {
    let (mut cpu, mut mem) = init(&[0xFF]);
    assert_eq!(cpu.tick(&mut mem), 16);
    assert_eq!(cpu.pc, 0x0038);
    assert_eq!(mem.read_word(cpu.sp), 0x0001);
}

#[test]
fn test_jumps() {
    // NOP; JR -3
    let (mut cpu, mut mem) = init(&[0x00, 0x18, 0xFD]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [4, 12]);
    assert_eq!(cpu.pc, 0);

    let (mut cpu, mut mem) = init(&[0xC3, 0x00, 0x20]);
    assert_eq!(cpu.tick(&mut mem), 16);
    assert_eq!(cpu.pc, 0x2000);

    // LD HL, 0x1234; JP HL
    let (mut cpu, mut mem) = init(&[0x21, 0x34, 0x12, 0xE9]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [12, 4]);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn test_conditional_jumps() {
    // XOR A; JR NZ, 5; JR Z, 5
    let (mut cpu, mut mem) = init(&[0xAF, 0x20, 0x05, 0x28, 0x05]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [4, 8]);
    assert_eq!(cpu.pc, 3);
    assert_eq!(cpu.tick(&mut mem), 12);
    assert_eq!(cpu.pc, 10);

    // SCF; JP NC, 0x2000; JP C, 0x2000
    let (mut cpu, mut mem) = init(&[0x37, 0xD2, 0x00, 0x20, 0xDA, 0x00, 0x20]);
    assert_eq!(run(&mut cpu, &mut mem, 3), [4, 12, 16]);
    assert_eq!(cpu.pc, 0x2000);
}

#[test]
fn test_sub_and_cp() {
    // LD A, 0x10; SUB 0x01; CP 0x0F
    let (mut cpu, mut mem) = init(&[0x3E, 0x10, 0xD6, 0x01, 0xFE, 0x0F]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.a(), 0x0F);
    assert_eq!(cpu.flags(), Flags::new(false, true, true, false));
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.a(), 0x0F);
    assert_eq!(cpu.flags(), Flags::new(true, true, false, false));
}

#[test]
fn test_alu_boundaries() {
    // (a, op, b, result, flags) where op is the immediate form of ADD or SUB
    let cases = [
        (0x00, 0xC6, 0x00, 0x00, Flags::new(true, false, false, false)),
        (0xFF, 0xC6, 0x01, 0x00, Flags::new(true, false, true, true)),
        (0x0F, 0xC6, 0x01, 0x10, Flags::new(false, false, true, false)),
        (0x80, 0xD6, 0x80, 0x00, Flags::new(true, true, false, false)),
        (0x00, 0xD6, 0x01, 0xFF, Flags::new(false, true, true, true)),
    ];
    for (a, op, b, res, flags) in cases {
        let (mut cpu, mut mem) = init(&[0x3E, a, op, b]);
        assert_eq!(run(&mut cpu, &mut mem, 2), [8, 8]);
        assert_eq!(cpu.a(), res, "0x{a:0>2X} op 0x{op:0>2X} 0x{b:0>2X}");
        assert_eq!(cpu.flags(), flags, "0x{a:0>2X} op 0x{op:0>2X} 0x{b:0>2X}");
    }
}

#[test]
fn test_carry_arithmetic() {
    // LD A, 0x0F; SCF; ADC A, 0x00
    let (mut cpu, mut mem) = init(&[0x3E, 0x0F, 0x37, 0xCE, 0x00]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.a(), 0x10);
    assert_eq!(cpu.flags(), Flags::new(false, false, true, false));

    // LD A, 0x00; SCF; SBC A, 0x00
    let (mut cpu, mut mem) = init(&[0x3E, 0x00, 0x37, 0xDE, 0x00]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.a(), 0xFF);
    assert_eq!(cpu.flags(), Flags::new(false, true, true, true));

    // LD A, 0xFF; SCF; ADC A, 0x00
    let (mut cpu, mut mem) = init(&[0x3E, 0xFF, 0x37, 0xCE, 0x00]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.a(), 0x00);
    assert_eq!(cpu.flags(), Flags::new(true, false, true, true));
}

#[test]
fn test_logic() {
    // LD A, 0xF0; AND 0x0F
    let (mut cpu, mut mem) = init(&[0x3E, 0xF0, 0xE6, 0x0F]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.a(), 0x00);
    assert_eq!(cpu.flags(), Flags::new(true, false, true, false));

    // LD A, 0xF0; LD B, 0x0F; OR B; XOR A
    let (mut cpu, mut mem) = init(&[0x3E, 0xF0, 0x06, 0x0F, 0xB0, 0xAF]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.a(), 0xFF);
    assert_eq!(cpu.flags(), Flags::default());
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.a(), 0x00);
    assert_eq!(cpu.flags(), Flags::new(true, false, false, false));
}

#[test]
fn test_inc_dec() {
    // SCF; LD A, 0x0F; INC A
    let (mut cpu, mut mem) = init(&[0x37, 0x3E, 0x0F, 0x3C]);
    assert_eq!(run(&mut cpu, &mut mem, 3), [4, 8, 4]);
    assert_eq!(cpu.a(), 0x10);
    assert_eq!(cpu.flags(), Flags::new(false, false, true, true));

    // LD B, 0x01; DEC B; DEC B
    let (mut cpu, mut mem) = init(&[0x06, 0x01, 0x05, 0x05]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.regs.get(HalfRegister::B), 0x00);
    assert_eq!(cpu.flags(), Flags::new(true, true, false, false));
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.regs.get(HalfRegister::B), 0xFF);
    assert_eq!(cpu.flags(), Flags::new(false, true, true, false));

    // LD HL, 0xC000; INC (HL)
    let (mut cpu, mut mem) = init(&[0x21, 0x00, 0xC0, 0x34]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [12, 12]);
    assert_eq!(mem.read_byte(WRAM), 0x01);
}

#[test]
fn test_wide_inc_dec() {
    let (mut cpu, mut mem) = init(&[0x21, 0xFF, 0xFF, 0x23]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [12, 8]);
    assert_eq!(cpu.hl(), 0x0000);
    assert_eq!(cpu.flags(), Flags::default());

    let (mut cpu, mut mem) = init(&[0x21, 0x00, 0x01, 0x2B]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.hl(), 0x00FF);

    // INC SP
    let (mut cpu, mut mem) = init(&[0x33]);
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.sp, 0xFFFF);
}

#[test]
fn test_daa() {
    // LD A, 0x15; ADD 0x27; DAA
    let (mut cpu, mut mem) = init(&[0x3E, 0x15, 0xC6, 0x27, 0x27]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.a(), 0x42);
    assert!(!cpu.carry_flag());

    // LD A, 0x42; SUB 0x15; DAA
    let (mut cpu, mut mem) = init(&[0x3E, 0x42, 0xD6, 0x15, 0x27]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.a(), 0x27);
    assert!(cpu.subtraction_flag());

    // LD A, 0x99; ADD 0x01; DAA
    let (mut cpu, mut mem) = init(&[0x3E, 0x99, 0xC6, 0x01, 0x27]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.a(), 0x00);
    assert_eq!(cpu.flags(), Flags::new(true, false, false, true));

    // LD A, 0x09; ADD 0x09; DAA
    let (mut cpu, mut mem) = init(&[0x3E, 0x09, 0xC6, 0x09, 0x27]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.a(), 0x18);
    assert_eq!(cpu.flags(), Flags::new(false, false, false, false));

    // LD A, 0x00; SUB 0x01; DAA
    let (mut cpu, mut mem) = init(&[0x3E, 0x00, 0xD6, 0x01, 0x27]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.a(), 0x99);
    assert_eq!(cpu.flags(), Flags::new(false, true, false, true));
}

#[test]
fn test_cpl_scf_ccf() {
    let (mut cpu, mut mem) = init(&[0x2F, 0x37, 0x3F]);
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.a(), u8::MAX);
    assert!(cpu.subtraction_flag(), "{cpu}");
    assert!(cpu.half_carry_flag(), "{cpu}");
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.flags(), Flags::new(false, false, false, true));
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.flags(), Flags::new(false, false, false, false));
}

#[test]
fn test_accumulator_rotates() {
    // LD A, 0x80; RLCA
    let (mut cpu, mut mem) = init(&[0x3E, 0x80, 0x07]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.a(), 0x01);
    assert_eq!(cpu.flags(), Flags::new(false, false, false, true));

    // SCF; RLA
    let (mut cpu, mut mem) = init(&[0x37, 0x17]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.a(), 0x01);
    assert!(!cpu.carry_flag());

    // XOR A; RRCA never sets the zero flag
    let (mut cpu, mut mem) = init(&[0xAF, 0x0F]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.a(), 0x00);
    assert!(!cpu.zero_flag());
}

#[test]
fn test_prefixed_bits() {
    // LD A, 0x80; BIT 7, A; BIT 0, A; RES 7, A; SET 0, A
    let (mut cpu, mut mem) = init(&[0x3E, 0x80, 0xCB, 0x7F, 0xCB, 0x47, 0xCB, 0xBF, 0xCB, 0xC7]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [8, 8]);
    assert_eq!(cpu.flags(), Flags::new(false, false, true, false));
    assert_eq!(cpu.last_instruction, LastInstruction::Executed(0xCB7F));
    run(&mut cpu, &mut mem, 1);
    assert!(cpu.zero_flag());
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.a(), 0x00);
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.a(), 0x01);
    assert_eq!(cpu.pc, 10);
}

#[test]
fn test_prefixed_pointer() {
    // LD HL, 0xC000; SET 0, (HL); BIT 0, (HL); SWAP (HL)
    let (mut cpu, mut mem) = init(&[0x21, 0x00, 0xC0, 0xCB, 0xC6, 0xCB, 0x46, 0xCB, 0x36]);
    assert_eq!(run(&mut cpu, &mut mem, 4), [12, 16, 12, 16]);
    assert_eq!(mem.read_byte(WRAM), 0x10);
    assert_eq!(cpu.last_instruction, LastInstruction::Executed(0xCB36));
}

#[test]
fn test_prefixed_shifts() {
    // LD A, 0xF1; SWAP A
    let (mut cpu, mut mem) = init(&[0x3E, 0xF1, 0xCB, 0x37]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.a(), 0x1F);
    assert_eq!(cpu.flags(), Flags::default());

    // LD B, 0x81; SRL B; SLA B; SRA B
    let (mut cpu, mut mem) = init(&[0x06, 0x81, 0xCB, 0x38, 0xCB, 0x20, 0xCB, 0x28]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.regs.get(HalfRegister::B), 0x40);
    assert!(cpu.carry_flag());
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.regs.get(HalfRegister::B), 0x80);
    assert!(!cpu.carry_flag());
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.regs.get(HalfRegister::B), 0xC0);

    // LD C, 0x01; RR C sets zero from the result
    let (mut cpu, mut mem) = init(&[0x0E, 0x01, 0xCB, 0x19]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.regs.get(HalfRegister::C), 0x00);
    assert_eq!(cpu.flags(), Flags::new(true, false, false, true));
}

#[test]
fn test_halt() {
    let (mut cpu, mut mem) = init(&[0x76, 0x00]);
    assert_eq!(cpu.tick(&mut mem), 0);
    assert_eq!(cpu.state, CpuState::Halted);
    assert_eq!(cpu.tick(&mut mem), 0);
    assert_eq!(cpu.pc, 1);
    cpu.state = CpuState::Running;
    assert_eq!(cpu.tick(&mut mem), 4);
    assert_eq!(cpu.pc, 2);
}

#[test]
fn test_stop() {
    let (mut cpu, mut mem) = init(&[0x10, 0x00, 0x00]);
    assert_eq!(cpu.tick(&mut mem), 0);
    assert_eq!(cpu.state, CpuState::Stopped);
    assert_eq!(cpu.pc, 2);
}

#[test]
fn test_ei_delay() {
    let (mut cpu, mut mem) = init(&[0xFB, 0x00, 0x00]);
    run(&mut cpu, &mut mem, 1);
    assert!(!cpu.ime);
    run(&mut cpu, &mut mem, 1);
    assert!(cpu.ime);

    // EI; DI
    let (mut cpu, mut mem) = init(&[0xFB, 0xF3, 0x00]);
    run(&mut cpu, &mut mem, 3);
    assert!(!cpu.ime);
    assert!(!cpu.to_set_ime);
}

#[test]
fn test_reti() {
    let mut program = vec![0; 0x11];
    program[..3].copy_from_slice(&[0xCD, 0x10, 0x00]);
    program[0x10] = 0xD9;
    let (mut cpu, mut mem) = init(&program);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.pc, 3);
    assert!(cpu.ime);
}

#[test_log::test]
fn test_invalid_opcode() {
    let (mut cpu, mut mem) = init(&[0x00, 0xD3]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [4, 0]);
    assert_eq!(
        cpu.state,
        CpuState::Faulted(Fault::InvalidOpcode {
            opcode: 0xD3,
            addr: 0x0001
        })
    );
    assert_eq!(cpu.last_instruction, LastInstruction::Invalid(0xD3));
    assert_eq!(mem.read_byte(0xFF50), 0x01);
    assert!(mem.boot_rom_disabled());
    assert_eq!(cpu.tick(&mut mem), 0);
    assert_eq!(cpu.pc, 2);
}

#[test]
fn test_high_page_loads() {
    // LD A, 0x42; LDH (0x80), A; LD A, 0x00; LDH A, (0x80)
    let (mut cpu, mut mem) = init(&[0x3E, 0x42, 0xE0, 0x80, 0x3E, 0x00, 0xF0, 0x80]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [8, 12]);
    assert_eq!(mem.read_byte(0xFF80), 0x42);
    assert_eq!(run(&mut cpu, &mut mem, 2), [8, 12]);
    assert_eq!(cpu.a(), 0x42);

    // LD C, 0x81; LD A, 0x24; LD (C), A; XOR A; LD A, (C)
    let (mut cpu, mut mem) = init(&[0x0E, 0x81, 0x3E, 0x24, 0xE2, 0xAF, 0xF2]);
    assert_eq!(run(&mut cpu, &mut mem, 3), [8, 8, 8]);
    assert_eq!(mem.read_byte(0xFF81), 0x24);
    assert_eq!(run(&mut cpu, &mut mem, 2), [4, 8]);
    assert_eq!(cpu.a(), 0x24);
}

#[test]
fn test_indirect_a() {
    // LD HL, 0xC000; LD A, 0x11; LD (HL+), A; LD (HL-), A; LD A, (HL+)
    let (mut cpu, mut mem) = init(&[0x21, 0x00, 0xC0, 0x3E, 0x11, 0x22, 0x32, 0x2A]);
    run(&mut cpu, &mut mem, 3);
    assert_eq!(mem.read_byte(WRAM), 0x11);
    assert_eq!(cpu.hl(), WRAM + 1);
    run(&mut cpu, &mut mem, 1);
    assert_eq!(mem.read_byte(WRAM + 1), 0x11);
    assert_eq!(cpu.hl(), WRAM);
    run(&mut cpu, &mut mem, 1);
    assert_eq!(cpu.hl(), WRAM + 1);
    assert_eq!(cpu.a(), 0x11);

    // LD DE, 0xC010; LD A, 0x5A; LD (DE), A; LD (0xC020), A; LD A, (0xC010)
    let (mut cpu, mut mem) = init(&[
        0x11, 0x10, 0xC0, 0x3E, 0x5A, 0x12, 0xEA, 0x20, 0xC0, 0xFA, 0x10, 0xC0,
    ]);
    assert_eq!(run(&mut cpu, &mut mem, 5), [12, 8, 8, 16, 16]);
    assert_eq!(mem.read_byte(0xC010), 0x5A);
    assert_eq!(mem.read_byte(0xC020), 0x5A);
    assert_eq!(cpu.a(), 0x5A);
}

#[test]
fn test_store_sp() {
    // LD SP, 0x1234; LD (0xC000), SP
    let (mut cpu, mut mem) = init(&[0x31, 0x34, 0x12, 0x08, 0x00, 0xC0]);
    assert_eq!(run(&mut cpu, &mut mem, 2), [12, 20]);
    assert_eq!(mem.read_byte(WRAM), 0x34);
    assert_eq!(mem.read_byte(WRAM + 1), 0x12);
}

#[test]
fn test_sp_offsets() {
    let (mut cpu, mut mem) = init(&[0xE8, 0x08]);
    cpu.sp = 0xFFF8;
    assert_eq!(cpu.tick(&mut mem), 16);
    assert_eq!(cpu.sp, 0x0000);
    assert_eq!(cpu.flags(), Flags::new(false, false, true, true));

    let (mut cpu, mut mem) = init(&[0xE8, 0xFE]);
    cpu.sp = 0x0005;
    cpu.tick(&mut mem);
    assert_eq!(cpu.sp, 0x0003);
    assert_eq!(cpu.flags(), Flags::new(false, false, true, true));

    // LD HL, SP-1; LD SP, HL
    let (mut cpu, mut mem) = init(&[0xF8, 0xFF, 0xF9]);
    cpu.sp = 0x0001;
    assert_eq!(run(&mut cpu, &mut mem, 2), [12, 8]);
    assert_eq!(cpu.hl(), 0x0000);
    assert_eq!(cpu.sp, 0x0000);
    assert_eq!(cpu.flags(), Flags::new(false, false, true, true));
}

#[test]
fn test_rom_writes_are_dropped() {
    // LD HL, 0x0000; LD (HL), 0xFF
    let (mut cpu, mut mem) = init(&[0x21, 0x00, 0x00, 0x36, 0xFF]);
    run(&mut cpu, &mut mem, 2);
    assert_eq!(mem.read_byte(0x0000), 0x21);
    assert!(cpu.is_running());
}

#[test]
fn test_display_and_snapshot() {
    let (mut cpu, mut mem) = init(&[0x3E, 0x42]);
    run(&mut cpu, &mut mem, 1);
    let text = cpu.to_string();
    assert!(text.contains("PC=0x0002"), "{text}");
    assert!(text.contains("SP=0xFFFE"), "{text}");
    let bytes = postcard::to_allocvec(&cpu).unwrap();
    let back: Cpu = postcard::from_bytes(&bytes).unwrap();
    assert_eq!(cpu, back);
}
