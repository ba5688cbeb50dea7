use chip8::cpu::decode::{decode, encode};
use chip8::cpu::io::{FixedRandom, NullKeypad};
use chip8::cpu::registers::FLAG;
use chip8::cpu::stack::STACK_CAPACITY;
use chip8::{Cpu, Instruction};
use proptest::prelude::*;

fn machine(program: &[Instruction]) -> Cpu {
    let bytes: Vec<u8> = program.iter().flat_map(|i| encode(i).to_be_bytes()).collect();
    let mut cpu = Cpu::with_io(Box::new(NullKeypad), Box::new(FixedRandom(0)));
    cpu.load_rom(&bytes).unwrap();
    cpu
}

fn alu(op: Instruction, a: u8, b: u8) -> (u8, u8) {
    let mut cpu = machine(&[op]);
    cpu.regs.set_reg(3, a);
    cpu.regs.set_reg(4, b);
    cpu.step().unwrap();
    (cpu.regs.reg(3), cpu.regs.reg(FLAG))
}

proptest! {
    #[test]
    fn add_sets_carry(a in any::<u8>(), b in any::<u8>()) {
        let (sum, flag) = alu(Instruction::Add { x: 3, y: 4 }, a, b);
        prop_assert_eq!(sum, a.wrapping_add(b));
        prop_assert_eq!(flag, (a as u16 + b as u16 > 0xFF) as u8);
    }

    #[test]
    fn sub_sets_no_borrow(a in any::<u8>(), b in any::<u8>()) {
        let (diff, flag) = alu(Instruction::Sub { x: 3, y: 4 }, a, b);
        prop_assert_eq!(diff, a.wrapping_sub(b));
        prop_assert_eq!(flag, (a >= b) as u8);

        let (diff, flag) = alu(Instruction::SubReverse { x: 3, y: 4 }, a, b);
        prop_assert_eq!(diff, b.wrapping_sub(a));
        prop_assert_eq!(flag, (b >= a) as u8);
    }

    #[test]
    fn index_stays_twelve_bit(addr in 0u16..0x1000, offset in any::<u8>()) {
        let mut cpu = machine(&[
            Instruction::LoadIndex { addr },
            Instruction::LoadImm { x: 0, value: offset },
            Instruction::AddIndex { x: 0 },
        ]);
        cpu.run_limited(3).unwrap();
        prop_assert_eq!(cpu.regs.i(), (addr + offset as u16) & 0x0FFF);
    }

    #[test]
    fn valid_opcodes_encode_back(raw in any::<u16>()) {
        if let Ok(instr) = decode(raw) {
            prop_assert_eq!(encode(&instr), raw);
        }
    }

    #[test]
    fn nested_calls_unwind(depth in 1u8..=STACK_CAPACITY as u8) {
        // 0x200: CALL 0x204
        // 0x202: JP 0x202
        // 0x204: ADD V0, 1
        // 0x206: SE V0, depth
        // 0x208: CALL 0x204
        // 0x20A: RET
        let mut cpu = machine(&[
            Instruction::Call { addr: 0x204 },
            Instruction::Jump { addr: 0x202 },
            Instruction::AddImm { x: 0, value: 1 },
            Instruction::SkipEqImm { x: 0, value: depth },
            Instruction::Call { addr: 0x204 },
            Instruction::Ret,
        ]);

        let mut deepest = 0;
        for _ in 0..(depth as usize * 4 + 4) {
            cpu.step().unwrap();
            deepest = deepest.max(cpu.stack.depth());
        }

        prop_assert_eq!(deepest, depth as usize);
        prop_assert!(cpu.stack.is_empty());
        prop_assert_eq!(cpu.regs.pc, 0x202);
        prop_assert_eq!(cpu.regs.reg(0), depth);
    }
}
