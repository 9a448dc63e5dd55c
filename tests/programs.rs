//! Whole programs run through the public API.

use chip8::cpu::registers::STACK_DEPTH;
use chip8::{encode, Cpu, CpuError, CpuState, Instruction};

fn assemble(instructions: &[Instruction]) -> Vec<u8> {
    instructions
        .iter()
        .flat_map(|i| encode(i).to_be_bytes())
        .collect()
}

fn boot(instructions: &[Instruction]) -> Cpu {
    let mut cpu = Cpu::with_seed(0xC8);
    cpu.install(&assemble(instructions)).expect("program fits");
    cpu
}

#[test]
fn counts_down_loop() {
    // V0 = 5; loop: V1 += 2; V0 -= 1 (via V2 = 1, 8025); skip if V0 == 0; jump loop
    let mut cpu = boot(&[
        Instruction::LoadImm { x: 0, nn: 5 },
        Instruction::LoadImm { x: 2, nn: 1 },
        Instruction::AddImm { x: 1, nn: 2 },
        Instruction::Sub { x: 0, y: 2 },
        Instruction::SkipEqImm { x: 0, nn: 0 },
        Instruction::Jump { nnn: 0x204 },
        Instruction::Jump { nnn: 0x20C },
    ]);

    cpu.run_limited(2 + 5 * 4).unwrap();
    assert_eq!(cpu.regs.v[0], 0);
    assert_eq!(cpu.regs.v[1], 10);
    assert_eq!(cpu.regs.pc, 0x20C);
}

#[test]
fn nested_calls_return_to_call_sites() {
    // 0x200: call 0x300 ; 0x202: jump self
    // 0x300: call 0x310 ; 0x302: ret
    // 0x310: V5 = 1     ; 0x312: ret
    let mut cpu = boot(&[
        Instruction::Call { nnn: 0x300 },
        Instruction::Jump { nnn: 0x202 },
    ]);
    for (addr, instr) in [
        (0x300, Instruction::Call { nnn: 0x310 }),
        (0x302, Instruction::Ret),
        (0x310, Instruction::LoadImm { x: 5, nn: 1 }),
        (0x312, Instruction::Ret),
    ] {
        let [hi, lo] = encode(&instr).to_be_bytes();
        cpu.mem.write(addr, hi);
        cpu.mem.write(addr + 1, lo);
    }

    let trace: Vec<u16> = (0..6)
        .map(|_| {
            cpu.step().unwrap();
            cpu.regs.pc
        })
        .collect();

    assert_eq!(trace, vec![0x300, 0x310, 0x312, 0x302, 0x202, 0x202]);
    assert_eq!(cpu.regs.v[5], 1);
    assert_eq!(cpu.regs.depth(), 0);
}

#[test]
fn recursion_to_the_stack_limit_overflows() {
    let mut cpu = boot(&[Instruction::Call { nnn: 0x200 }]);
    let result = cpu.run_limited(100);

    assert!(matches!(result, Err(CpuError::StackOverflow { depth, .. }) if depth == STACK_DEPTH));
    assert_eq!(cpu.regs.depth(), STACK_DEPTH);
    assert_eq!(cpu.state, CpuState::Faulted);
}

#[test]
fn unknown_opcode_halts_and_reports() {
    let mut program = assemble(&[Instruction::LoadImm { x: 0, nn: 1 }]);
    program.extend_from_slice(&[0x5A, 0xB1]);
    let mut cpu = Cpu::with_seed(1);
    cpu.install(&program).unwrap();

    let err = cpu.run_limited(10).unwrap_err();
    assert_eq!(err.opcode(), Some(0x5AB1));
    assert!(err.to_string().contains("0x5AB1"));
    assert!(err.to_string().contains("0x202"));
    assert_eq!(cpu.cycles, 1);
    assert!(cpu.step().is_err());
}

#[test]
fn draws_digit_with_bcd_and_font() {
    // Draw the hundreds digit of 137 at (0, 0)
    let mut cpu = boot(&[
        Instruction::LoadImm { x: 0, nn: 137 },
        Instruction::LoadIndex { nnn: 0x400 },
        Instruction::Bcd { x: 0 },
        Instruction::LoadRegs { x: 2 },
        Instruction::FontChar { x: 0 },
        Instruction::LoadImm { x: 3, nn: 0 },
        Instruction::Draw { x: 3, y: 3, n: 5 },
    ]);
    cpu.run_limited(7).unwrap();

    assert_eq!(&cpu.regs.v[..3], &[1, 3, 7]);
    // Glyph "1" is 0x20 0x60 0x20 0x20 0x70
    let fb = cpu.framebuffer();
    assert!(fb.pixel(2, 0));
    assert!(fb.pixel(1, 1) && fb.pixel(2, 1));
    assert!(fb.pixel(1, 4) && fb.pixel(2, 4) && fb.pixel(3, 4));
    assert_eq!(fb.lit(), 1 + 2 + 1 + 1 + 3);
    assert_eq!(cpu.regs.v[0xF], 0);
}

#[test]
fn sprite_at_right_edge_wraps_within_row() {
    let mut cpu = boot(&[
        Instruction::LoadImm { x: 0, nn: 60 },
        Instruction::LoadImm { x: 1, nn: 10 },
        Instruction::LoadIndex { nnn: 0x300 },
        Instruction::Draw { x: 0, y: 1, n: 1 },
    ]);
    cpu.mem.write(0x300, 0xFF);
    cpu.run_limited(4).unwrap();

    let fb = cpu.framebuffer();
    let lit: Vec<(usize, usize)> = (0..32)
        .flat_map(|y| (0..64).map(move |x| (x, y)))
        .filter(|&(x, y)| fb.pixel(x, y))
        .collect();
    assert_eq!(
        lit,
        vec![(0, 10), (1, 10), (2, 10), (3, 10), (60, 10), (61, 10), (62, 10), (63, 10)]
    );
}

#[test]
fn wait_for_key_holds_until_pressed() {
    let mut cpu = boot(&[
        Instruction::WaitKey { x: 4 },
        Instruction::LoadImm { x: 5, nn: 0xAA },
    ]);
    let before = cpu.mem.clone();

    for _ in 0..10 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.regs.pc, 0x200);
    assert!(cpu.is_awaiting_key());
    assert_eq!(cpu.mem, before);
    assert_eq!(cpu.regs.v[5], 0);

    let mut keys = [false; 16];
    keys[0xE] = true;
    cpu.set_keys(keys);
    cpu.step().unwrap();
    assert_eq!(cpu.regs.v[4], 0xE);
    assert_eq!(cpu.regs.pc, 0x202);

    cpu.step().unwrap();
    assert_eq!(cpu.regs.v[5], 0xAA);
}

#[test]
fn delay_timer_busy_wait() {
    // DT = 3; loop until DT == 0
    let mut cpu = boot(&[
        Instruction::LoadImm { x: 0, nn: 3 },
        Instruction::SetDelay { x: 0 },
        Instruction::GetDelay { x: 1 },
        Instruction::SkipEqImm { x: 1, nn: 0 },
        Instruction::Jump { nnn: 0x204 },
        Instruction::LoadImm { x: 2, nn: 0x55 },
    ]);
    cpu.run_limited(2).unwrap();

    for _ in 0..3 {
        cpu.run_limited(30).unwrap();
        assert_ne!(cpu.regs.v[2], 0x55);
        cpu.tick_timers();
    }
    // Each pass of the loop is three instructions, so PC is back at 0x204
    cpu.run_limited(3).unwrap();
    assert_eq!(cpu.regs.v[2], 0x55);
    assert_eq!(cpu.regs.pc, 0x20C);
}
