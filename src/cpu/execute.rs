//! CPU execution engine for CHIP-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.
//! The host drives the machine: it calls `step` at whatever instruction rate
//! it likes and `tick_timers` at `TIMER_HZ`.

use crate::cpu::decode::{self, DecodeError, Instruction};
use crate::cpu::display::Display;
use crate::cpu::io::{Keypad, NullKeypad, RandomSource, StdRandom, NUM_KEYS};
use crate::cpu::memory::{
    Memory, MemoryError, ADDR_MASK, FONT_START, GLYPH_SIZE, PROGRAM_CAPACITY, PROGRAM_END, PROGRAM_START,
};
use crate::cpu::registers::{Registers, INSTRUCTION_WIDTH};
use crate::cpu::stack::{CallStack, StackError};
use log::{debug, error, trace, warn};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Rate at which the host should call `tick_timers`.
pub const TIMER_HZ: u32 = 60;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// Ready to execute the next instruction.
    Running,
    /// Stalled on FX0A until `press_key` delivers a key into VX.
    AwaitingKey(u8),
    /// A fatal error occurred; see `Cpu::fault`.
    Halted,
}

/// Execution status with the fault that halted the machine, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Running,
    AwaitingKey(u8),
    Halted(CpuError),
}

/// Outcome of a single `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An instruction ran to completion.
    Executed(Instruction),
    /// The machine is stalled until a key is pressed.
    AwaitingKey { register: u8 },
}

/// The CHIP-8 machine.
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Return addresses, stored in the stack region of `mem`.
    pub stack: CallStack,
    /// Framebuffer.
    pub display: Display,
    /// Instruction count.
    pub cycles: u64,
    status: Status,
    last_instr: Option<Instruction>,
    keypad: Box<dyn Keypad>,
    rng: Box<dyn RandomSource>,
}

impl Cpu {
    /// Create a machine with no keys pressed and an entropy-seeded RNG.
    pub fn new() -> Self {
        Self::with_io(Box::new(NullKeypad), Box::new(StdRandom::from_entropy()))
    }

    /// Create a machine with explicit collaborators.
    pub fn with_io(keypad: Box<dyn Keypad>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            stack: CallStack::new(),
            display: Display::new(),
            cycles: 0,
            status: Status::Running,
            last_instr: None,
            keypad,
            rng,
        }
    }

    /// Replace the keypad collaborator.
    pub fn set_keypad(&mut self, keypad: Box<dyn Keypad>) {
        self.keypad = keypad;
    }

    /// Replace the random source.
    pub fn set_random(&mut self, rng: Box<dyn RandomSource>) {
        self.rng = rng;
    }

    /// Reset the machine to its power-on state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.stack.clear();
        self.display.clear();
        self.status = Status::Running;
        self.cycles = 0;
        self.last_instr = None;
        debug!("machine reset");
    }

    /// Reset and load a ROM image at the program origin.
    ///
    /// On error the machine is left untouched.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), MemoryError> {
        if rom.len() > PROGRAM_CAPACITY {
            return Err(MemoryError::RomTooLarge { size: rom.len(), capacity: PROGRAM_CAPACITY });
        }

        self.reset();
        self.mem.load_block(PROGRAM_START, rom)?;
        self.regs.jump(PROGRAM_START);
        debug!("loaded {} byte ROM at {:#05X}", rom.len(), PROGRAM_START);
        Ok(())
    }

    /// Execute a single instruction.
    ///
    /// A fatal error halts the machine; the same error is returned, and
    /// every later call returns `CpuError::Halted` wrapping it.
    pub fn step(&mut self) -> Result<Step, CpuError> {
        match &self.status {
            Status::Halted(fault) => return Err(CpuError::Halted(Box::new(fault.clone()))),
            Status::AwaitingKey(register) => return Ok(Step::AwaitingKey { register: *register }),
            Status::Running => {}
        }

        match self.cycle() {
            Ok(step) => Ok(step),
            Err(e) => {
                error!("halted at PC={:#05X}: {}", self.regs.pc, e);
                self.status = Status::Halted(e.clone());
                Err(e)
            }
        }
    }

    /// Run for at most `max_cycles` instructions, stopping early on a key
    /// wait. Returns the number of instructions executed.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.is_running() && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Count both timers down one step. Call at `TIMER_HZ`.
    ///
    /// Timers are frozen while the machine waits for a key or is halted.
    pub fn tick_timers(&mut self) {
        if self.is_running() {
            self.regs.tick_timers();
        }
    }

    /// Deliver a key press to a machine stalled on FX0A.
    ///
    /// Returns true if the press resumed the machine.
    pub fn press_key(&mut self, key: u8) -> bool {
        match self.status {
            Status::AwaitingKey(register) if key < NUM_KEYS => {
                self.regs.set_reg(register as usize, key);
                self.status = Status::Running;
                debug!("key {:X} resumed execution into V{:X}", key, register);
                true
            }
            _ => false,
        }
    }

    /// Fetch, decode and execute one instruction.
    fn cycle(&mut self) -> Result<Step, CpuError> {
        let raw = self.fetch()?;
        trace!("{:#05X}: {:04X}", self.regs.pc.wrapping_sub(INSTRUCTION_WIDTH), raw);

        let instr = decode::decode(raw)?;
        let step = self.execute(instr)?;

        self.cycles += 1;
        self.last_instr = Some(instr);
        Ok(step)
    }

    /// Read the opcode at PC and advance PC past it.
    fn fetch(&mut self) -> Result<u16, CpuError> {
        let pc = self.regs.pc;
        if pc < PROGRAM_START || pc + 1 > PROGRAM_END {
            return Err(CpuError::PcOutOfBounds(pc));
        }
        let raw = self.mem.read_word(pc);
        self.regs.advance_pc();
        Ok(raw)
    }

    /// Execute a decoded instruction. PC already points past it.
    fn execute(&mut self, instr: Instruction) -> Result<Step, CpuError> {
        match instr {
            // ==================== Flow control ====================

            Instruction::Cls => {
                self.display.clear();
            }

            Instruction::Ret => {
                let addr = self.stack.pop(&self.mem).map_err(|e| self.stack_fault(e))?;
                self.regs.jump(addr);
            }

            Instruction::Jump { addr } => {
                self.regs.jump(addr);
            }

            Instruction::Call { addr } => {
                let ret = self.regs.pc;
                self.stack.push(&mut self.mem, ret).map_err(|e| self.stack_fault(e))?;
                self.regs.jump(addr);
            }

            Instruction::JumpOffset { addr } => {
                let target = addr + self.regs.reg(0) as u16;
                self.regs.jump(target);
            }

            // ==================== Skips ====================

            Instruction::SkipEqImm { x, value } => {
                if self.v(x) == value {
                    self.regs.skip();
                }
            }

            Instruction::SkipNeImm { x, value } => {
                if self.v(x) != value {
                    self.regs.skip();
                }
            }

            Instruction::SkipEqReg { x, y } => {
                if self.v(x) == self.v(y) {
                    self.regs.skip();
                }
            }

            Instruction::SkipNeReg { x, y } => {
                if self.v(x) != self.v(y) {
                    self.regs.skip();
                }
            }

            Instruction::SkipKeyDown { x } => {
                if self.keypad.is_key_down(self.v(x) & 0xF) {
                    self.regs.skip();
                }
            }

            Instruction::SkipKeyUp { x } => {
                if !self.keypad.is_key_down(self.v(x) & 0xF) {
                    self.regs.skip();
                }
            }

            // ==================== Registers ====================

            Instruction::LoadImm { x, value } => {
                self.set_v(x, value);
            }

            Instruction::AddImm { x, value } => {
                self.set_v(x, self.v(x).wrapping_add(value));
            }

            Instruction::Move { x, y } => {
                self.set_v(x, self.v(y));
            }

            Instruction::Or { x, y } => {
                self.set_v(x, self.v(x) | self.v(y));
            }

            Instruction::And { x, y } => {
                self.set_v(x, self.v(x) & self.v(y));
            }

            Instruction::Xor { x, y } => {
                self.set_v(x, self.v(x) ^ self.v(y));
            }

            // Flag-producing ops compute from the operands first and write VF
            // last, so VF as an operand or destination still ends up a flag.
            Instruction::Add { x, y } => {
                let (sum, carry) = self.v(x).overflowing_add(self.v(y));
                self.set_v(x, sum);
                self.regs.set_flag(carry);
            }

            Instruction::Sub { x, y } => {
                let (vx, vy) = (self.v(x), self.v(y));
                self.set_v(x, vx.wrapping_sub(vy));
                self.regs.set_flag(vx >= vy);
            }

            Instruction::ShiftRight { x, .. } => {
                let vx = self.v(x);
                self.set_v(x, vx >> 1);
                self.regs.set_flag(vx & 0x01 != 0);
            }

            Instruction::SubReverse { x, y } => {
                let (vx, vy) = (self.v(x), self.v(y));
                self.set_v(x, vy.wrapping_sub(vx));
                self.regs.set_flag(vy >= vx);
            }

            Instruction::ShiftLeft { x, .. } => {
                let vx = self.v(x);
                self.set_v(x, vx << 1);
                self.regs.set_flag(vx & 0x80 != 0);
            }

            Instruction::Random { x, mask } => {
                let byte = self.rng.next_byte();
                self.set_v(x, byte & mask);
            }

            // ==================== Index and memory ====================

            Instruction::LoadIndex { addr } => {
                self.regs.set_i(addr);
            }

            Instruction::AddIndex { x } => {
                let target = self.regs.i() + self.v(x) as u16;
                self.regs.set_i(target);
            }

            Instruction::FontAddress { x } => {
                let digit = (self.v(x) & 0xF) as u16;
                self.regs.set_i(FONT_START + digit * GLYPH_SIZE);
            }

            Instruction::StoreBcd { x } => {
                let value = self.v(x);
                let i = self.regs.i();
                self.store(i, value / 100);
                self.store(i.wrapping_add(1), (value / 10) % 10);
                self.store(i.wrapping_add(2), value % 10);
            }

            Instruction::StoreBlock { x } => {
                let i = self.regs.i();
                for n in 0..=x {
                    self.store(i.wrapping_add(n as u16), self.v(n));
                }
            }

            Instruction::LoadBlock { x } => {
                let i = self.regs.i();
                for n in 0..=x {
                    let value = self.mem.read(i.wrapping_add(n as u16));
                    self.set_v(n, value);
                }
            }

            // ==================== Display ====================

            Instruction::Draw { x, y, height } => {
                let i = self.regs.i();
                let sprite: Vec<u8> = (0..height as u16)
                    .map(|row| self.mem.read(i.wrapping_add(row)))
                    .collect();
                let (px, py) = (self.v(x), self.v(y));
                let collision = self.display.draw_sprite(px, py, &sprite);
                self.regs.set_flag(collision);
            }

            // ==================== Timers and input ====================

            Instruction::ReadDelay { x } => {
                self.set_v(x, self.regs.delay);
            }

            Instruction::WaitKey { x } => {
                debug!("waiting for key into V{:X}", x);
                self.status = Status::AwaitingKey(x);
                return Ok(Step::AwaitingKey { register: x });
            }

            Instruction::SetDelay { x } => {
                self.regs.delay = self.v(x);
            }

            Instruction::SetSound { x } => {
                self.regs.sound = self.v(x);
            }
        }

        Ok(Step::Executed(instr))
    }

    #[inline]
    fn v(&self, index: u8) -> u8 {
        self.regs.reg(index as usize)
    }

    #[inline]
    fn set_v(&mut self, index: u8, value: u8) {
        self.regs.set_reg(index as usize, value);
    }

    /// Store a byte on behalf of an instruction. The font area is read-only.
    fn store(&mut self, addr: u16, value: u8) {
        if Memory::is_reserved(addr) {
            warn!("dropped write of {:#04X} to reserved address {:#05X}", value, addr & ADDR_MASK);
            return;
        }
        self.mem.write(addr, value);
    }

    fn stack_fault(&self, e: StackError) -> CpuError {
        let pc = self.regs.pc.wrapping_sub(INSTRUCTION_WIDTH);
        match e {
            StackError::Overflow => CpuError::StackOverflow { pc },
            StackError::Underflow => CpuError::StackUnderflow { pc },
        }
    }

    /// Current execution state.
    pub fn state(&self) -> CpuState {
        match self.status {
            Status::Running => CpuState::Running,
            Status::AwaitingKey(x) => CpuState::AwaitingKey(x),
            Status::Halted(_) => CpuState::Halted,
        }
    }

    /// The error that halted the machine, if any.
    pub fn fault(&self) -> Option<&CpuError> {
        match &self.status {
            Status::Halted(fault) => Some(fault),
            _ => None,
        }
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        matches!(self.status, Status::Halted(_))
    }

    /// Check if the CPU is ready to execute.
    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    /// Whether a tone should be playing.
    pub fn sound_active(&self) -> bool {
        self.regs.sound > 0
    }

    /// Serializable view of the machine for hosts and tooling.
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            state: self.state(),
            fault: self.fault().map(|e| e.to_string()),
            cycles: self.cycles,
            registers: self.regs.clone(),
            stack: self.stack.frames(&self.mem),
            screen: self.display.to_strings(),
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("status", &self.status)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("stack", &self.stack)
            .finish()
    }
}

/// Point-in-time copy of the machine's visible state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub state: CpuState,
    pub fault: Option<String>,
    pub cycles: u64,
    pub registers: Registers,
    pub stack: Vec<u16>,
    pub screen: Vec<String>,
}

/// Errors that can occur during CPU execution. All of them halt the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("invalid opcode {0:#06X}")]
    InvalidOpcode(u16),

    #[error("call stack overflow at PC={pc:#05X}")]
    StackOverflow { pc: u16 },

    #[error("return with empty call stack at PC={pc:#05X}")]
    StackUnderflow { pc: u16 },

    #[error("PC {0:#05X} outside program area")]
    PcOutOfBounds(u16),

    #[error("machine halted: {0}")]
    Halted(Box<CpuError>),
}

impl From<DecodeError> for CpuError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::InvalidOpcode(raw) => CpuError::InvalidOpcode(raw),
        }
    }
}
