//! End-to-end runs through the public API.

use chip8::cpu::decode::encode;
use chip8::cpu::io::{FixedRandom, NullKeypad};
use chip8::cpu::memory::PROGRAM_CAPACITY;
use chip8::cpu::registers::FLAG;
use chip8::{Cpu, CpuError, CpuState, Instruction, KeyState, Rom, RomError, Step, StdRandom};

fn assemble(program: &[Instruction]) -> Vec<u8> {
    program.iter().flat_map(|i| encode(i).to_be_bytes()).collect()
}

fn boot(program: &[Instruction]) -> Cpu {
    let mut cpu = Cpu::with_io(Box::new(NullKeypad), Box::new(FixedRandom(0)));
    cpu.load_rom(&assemble(program)).unwrap();
    cpu
}

#[test]
fn draws_score_digits() {
    // Print 137 as three glyphs using BCD + font lookups
    let mut cpu = boot(&[
        Instruction::LoadImm { x: 0, value: 137 },
        Instruction::LoadIndex { addr: 0x300 },
        Instruction::StoreBcd { x: 0 },
        Instruction::LoadBlock { x: 2 },
        Instruction::LoadImm { x: 3, value: 0 },
        Instruction::LoadImm { x: 4, value: 0 },
        Instruction::FontAddress { x: 0 },
        Instruction::Draw { x: 3, y: 4, height: 5 },
        Instruction::AddImm { x: 3, value: 5 },
        Instruction::FontAddress { x: 1 },
        Instruction::Draw { x: 3, y: 4, height: 5 },
        Instruction::AddImm { x: 3, value: 5 },
        Instruction::FontAddress { x: 2 },
        Instruction::Draw { x: 3, y: 4, height: 5 },
        Instruction::Jump { addr: 0x21C },
    ]);

    cpu.run_limited(100).unwrap();

    assert_eq!(cpu.regs.all()[..3], [1, 3, 7]);
    assert_eq!(cpu.regs.reg(FLAG), 0);
    assert_eq!(cpu.regs.pc, 0x21C);

    let screen = cpu.display.to_strings();
    assert_eq!(&screen[0][..15], "..#..####.####.");
    assert_eq!(&screen[4][..15], ".###.####..#...");
    assert_eq!(screen[5], ".".repeat(64));
}

#[test]
fn sprite_wraps_around_corner() {
    let mut rom = assemble(&[
        Instruction::LoadImm { x: 0, value: 62 },
        Instruction::LoadImm { x: 1, value: 31 },
        Instruction::LoadIndex { addr: 0x20A },
        Instruction::Draw { x: 0, y: 1, height: 2 },
        Instruction::Jump { addr: 0x208 },
    ]);
    // 0x20A: a 2x2 block
    rom.extend([0xC0, 0xC0]);

    let mut cpu = Cpu::with_io(Box::new(NullKeypad), Box::new(FixedRandom(0)));
    cpu.load_rom(&rom).unwrap();
    cpu.run_limited(4).unwrap();

    assert!(cpu.display.pixel(62, 31));
    assert!(cpu.display.pixel(63, 31));
    assert!(cpu.display.pixel(62, 0));
    assert!(cpu.display.pixel(63, 0));
    assert_eq!(cpu.display.lit(), 4);
}

#[test]
fn key_wait_round_trip() {
    let mut cpu = boot(&[
        Instruction::WaitKey { x: 7 },
        Instruction::SkipKeyDown { x: 7 },
        Instruction::LoadImm { x: 1, value: 0xAA },
        Instruction::Jump { addr: 0x206 },
    ]);

    assert_eq!(cpu.run_limited(50), Ok(1));
    assert_eq!(cpu.state(), CpuState::AwaitingKey(7));

    let mut keys = KeyState::new();
    keys.set(0x3, true);
    cpu.set_keypad(Box::new(keys));
    assert!(cpu.press_key(0x3));

    // Key still held: the skip is taken and V1 stays clear
    cpu.run_limited(3).unwrap();
    assert_eq!(cpu.regs.reg(7), 0x3);
    assert_eq!(cpu.regs.reg(1), 0);
    assert_eq!(cpu.regs.pc, 0x206);
}

#[test]
fn runaway_recursion_halts_on_49th_call() {
    let mut cpu = boot(&[Instruction::Call { addr: 0x200 }]);

    let err = cpu.run_limited(u64::MAX / 2).unwrap_err();
    assert_eq!(err, CpuError::StackOverflow { pc: 0x200 });
    assert_eq!(cpu.stack.depth(), 48);
    assert!(cpu.is_halted());

    assert!(matches!(cpu.step(), Err(CpuError::Halted(_))));
}

#[test]
fn all_ones_opcode_is_invalid() {
    let mut cpu = Cpu::new();
    cpu.load_rom(&[0x0F, 0xFF]).unwrap();

    let err = cpu.step().unwrap_err();
    assert_eq!(err, CpuError::InvalidOpcode(0x0FFF));
    assert_eq!(err.to_string(), "invalid opcode 0x0FFF");
}

#[test]
fn running_off_the_program_area_halts() {
    // Fill the whole program area with 6000 (LD V0, 0); the last opcode
    // straddles the final byte of the area
    let mut rom = [0x60u8, 0x00].repeat(PROGRAM_CAPACITY / 2);
    rom.push(0x60);
    assert_eq!(rom.len(), PROGRAM_CAPACITY);

    let mut cpu = Cpu::new();
    cpu.load_rom(&rom).unwrap();

    let err = cpu.run_limited(10_000).unwrap_err();
    assert_eq!(err, CpuError::PcOutOfBounds(0xEA0));
    assert_eq!(cpu.cycles, (PROGRAM_CAPACITY as u64 + 1) / 2);
}

#[test]
fn seeded_random_is_reproducible() {
    let program = assemble(&[
        Instruction::Random { x: 0, mask: 0xFF },
        Instruction::Random { x: 1, mask: 0xFF },
        Instruction::Random { x: 2, mask: 0x0F },
    ]);

    let run = |seed| {
        let mut cpu = Cpu::new();
        cpu.set_random(Box::new(StdRandom::seeded(seed)));
        cpu.load_rom(&program).unwrap();
        cpu.run_limited(3).unwrap();
        cpu.regs.all()[..3].to_vec()
    };

    let first = run(42);
    assert_eq!(first, run(42));
    assert!(first[2] <= 0x0F);
}

#[test]
fn rom_size_limits() {
    assert_eq!(Rom::from_bytes("empty", Vec::new()), Err(RomError::Empty));
    assert!(Rom::from_bytes("full", vec![0; PROGRAM_CAPACITY]).is_ok());
    assert_eq!(
        Rom::from_bytes("big", vec![0; PROGRAM_CAPACITY + 1]),
        Err(RomError::TooLarge { size: PROGRAM_CAPACITY + 1, capacity: PROGRAM_CAPACITY }),
    );

    let mut cpu = Cpu::new();
    assert!(cpu.load_rom(&vec![0; PROGRAM_CAPACITY + 1]).is_err());
}

#[test]
fn snapshot_serializes_to_json() {
    let mut cpu = boot(&[Instruction::Call { addr: 0x204 }, Instruction::Cls, Instruction::Ret]);
    assert!(matches!(cpu.step(), Ok(Step::Executed(Instruction::Call { addr: 0x204 }))));

    let json = serde_json::to_string(&cpu.snapshot()).unwrap();
    assert!(json.contains("\"state\":\"Running\""));
    assert!(json.contains("\"stack\":[514]"));
}
