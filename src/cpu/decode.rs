//! Instruction decoder for CHIP-8.
//!
//! Every instruction is one big-endian 16-bit word. The high nibble picks
//! one of 16 primary classes through `PRIMARY`; classes 0, 8, E and F look
//! at the low byte or low nibble to pick the instruction inside the class.
//!
//! Field names follow the usual notation:
//! NNN = low 12 bits, NN = low byte, N = low nibble, X = bits 8-11, Y = bits 4-7.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// A raw 16-bit opcode with field accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Bits 12-15.
    #[inline]
    pub fn class(self) -> u8 {
        (self.0 >> 12) as u8
    }

    #[inline]
    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }

    #[inline]
    pub fn nn(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    #[inline]
    pub fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    #[inline]
    pub fn x(self) -> u8 {
        ((self.0 >> 8) & 0xF) as u8
    }

    #[inline]
    pub fn y(self) -> u8 {
        ((self.0 >> 4) & 0xF) as u8
    }
}

/// Decoded CHIP-8 instruction.
///
/// Register operands are indices 0-15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Flow control ====================

    /// 00E0: clear the screen
    Cls,

    /// 00EE: return from subroutine
    Ret,

    /// 1NNN: PC := NNN
    Jump { addr: u16 },

    /// 2NNN: push PC, PC := NNN
    Call { addr: u16 },

    /// BNNN: PC := V0 + NNN
    JumpOffset { addr: u16 },

    // ==================== Skips ====================

    /// 3XNN: skip if VX == NN
    SkipEqImm { x: u8, value: u8 },

    /// 4XNN: skip if VX != NN
    SkipNeImm { x: u8, value: u8 },

    /// 5XY0: skip if VX == VY
    SkipEqReg { x: u8, y: u8 },

    /// 9XY0: skip if VX != VY
    SkipNeReg { x: u8, y: u8 },

    /// EX9E: skip if key VX is down
    SkipKeyDown { x: u8 },

    /// EXA1: skip if key VX is up
    SkipKeyUp { x: u8 },

    // ==================== Registers ====================

    /// 6XNN: VX := NN
    LoadImm { x: u8, value: u8 },

    /// 7XNN: VX := VX + NN, VF untouched
    AddImm { x: u8, value: u8 },

    /// 8XY0: VX := VY
    Move { x: u8, y: u8 },

    /// 8XY1: VX := VX | VY
    Or { x: u8, y: u8 },

    /// 8XY2: VX := VX & VY
    And { x: u8, y: u8 },

    /// 8XY3: VX := VX ^ VY
    Xor { x: u8, y: u8 },

    /// 8XY4: VX := VX + VY, VF := carry
    Add { x: u8, y: u8 },

    /// 8XY5: VX := VX - VY, VF := no borrow
    Sub { x: u8, y: u8 },

    /// 8XY6: VF := VX & 1, VX := VX >> 1
    ShiftRight { x: u8, y: u8 },

    /// 8XY7: VX := VY - VX, VF := no borrow
    SubReverse { x: u8, y: u8 },

    /// 8XYE: VF := VX >> 7, VX := VX << 1
    ShiftLeft { x: u8, y: u8 },

    /// CXNN: VX := random & NN
    Random { x: u8, mask: u8 },

    // ==================== Index and memory ====================

    /// ANNN: I := NNN
    LoadIndex { addr: u16 },

    /// FX1E: I := I + VX
    AddIndex { x: u8 },

    /// FX29: I := glyph address of digit VX
    FontAddress { x: u8 },

    /// FX33: [I..I+3] := BCD(VX)
    StoreBcd { x: u8 },

    /// FX55: [I..=I+X] := V0..=VX
    StoreBlock { x: u8 },

    /// FX65: V0..=VX := [I..=I+X]
    LoadBlock { x: u8 },

    // ==================== Display ====================

    /// DXYN: draw N rows from [I] at (VX, VY), VF := collision
    Draw { x: u8, y: u8, height: u8 },

    // ==================== Timers and input ====================

    /// FX07: VX := DT
    ReadDelay { x: u8 },

    /// FX0A: wait for a key press, VX := key
    WaitKey { x: u8 },

    /// FX15: DT := VX
    SetDelay { x: u8 },

    /// FX18: ST := VX
    SetSound { x: u8 },
}

type Handler = fn(Opcode) -> Result<Instruction, DecodeError>;

/// Primary dispatch, indexed by the high nibble.
const PRIMARY: [Handler; 16] = [
    decode_system,
    decode_jump,
    decode_call,
    decode_skip_eq_imm,
    decode_skip_ne_imm,
    decode_skip_eq_reg,
    decode_load_imm,
    decode_add_imm,
    decode_alu,
    decode_skip_ne_reg,
    decode_load_index,
    decode_jump_offset,
    decode_random,
    decode_draw,
    decode_keys,
    decode_misc,
];

/// Decode a 16-bit opcode.
pub fn decode(raw: u16) -> Result<Instruction, DecodeError> {
    let op = Opcode(raw);
    PRIMARY[op.class() as usize](op)
}

/// 0x0___: only 00E0 and 00EE exist. 0NNN machine-code calls are rejected.
fn decode_system(op: Opcode) -> Result<Instruction, DecodeError> {
    match op.0 {
        0x00E0 => Ok(Instruction::Cls),
        0x00EE => Ok(Instruction::Ret),
        _ => Err(DecodeError::InvalidOpcode(op.0)),
    }
}

fn decode_jump(op: Opcode) -> Result<Instruction, DecodeError> {
    Ok(Instruction::Jump { addr: op.nnn() })
}

fn decode_call(op: Opcode) -> Result<Instruction, DecodeError> {
    Ok(Instruction::Call { addr: op.nnn() })
}

fn decode_skip_eq_imm(op: Opcode) -> Result<Instruction, DecodeError> {
    Ok(Instruction::SkipEqImm { x: op.x(), value: op.nn() })
}

fn decode_skip_ne_imm(op: Opcode) -> Result<Instruction, DecodeError> {
    Ok(Instruction::SkipNeImm { x: op.x(), value: op.nn() })
}

fn decode_load_imm(op: Opcode) -> Result<Instruction, DecodeError> {
    Ok(Instruction::LoadImm { x: op.x(), value: op.nn() })
}

fn decode_add_imm(op: Opcode) -> Result<Instruction, DecodeError> {
    Ok(Instruction::AddImm { x: op.x(), value: op.nn() })
}

fn decode_load_index(op: Opcode) -> Result<Instruction, DecodeError> {
    Ok(Instruction::LoadIndex { addr: op.nnn() })
}

fn decode_jump_offset(op: Opcode) -> Result<Instruction, DecodeError> {
    Ok(Instruction::JumpOffset { addr: op.nnn() })
}

fn decode_random(op: Opcode) -> Result<Instruction, DecodeError> {
    Ok(Instruction::Random { x: op.x(), mask: op.nn() })
}

fn decode_draw(op: Opcode) -> Result<Instruction, DecodeError> {
    Ok(Instruction::Draw { x: op.x(), y: op.y(), height: op.n() })
}

fn decode_skip_eq_reg(op: Opcode) -> Result<Instruction, DecodeError> {
    match op.n() {
        0x0 => Ok(Instruction::SkipEqReg { x: op.x(), y: op.y() }),
        _ => Err(DecodeError::InvalidOpcode(op.0)),
    }
}

fn decode_skip_ne_reg(op: Opcode) -> Result<Instruction, DecodeError> {
    match op.n() {
        0x0 => Ok(Instruction::SkipNeReg { x: op.x(), y: op.y() }),
        _ => Err(DecodeError::InvalidOpcode(op.0)),
    }
}

/// 0x8XY_: secondary dispatch on N.
fn decode_alu(op: Opcode) -> Result<Instruction, DecodeError> {
    let (x, y) = (op.x(), op.y());
    let instruction = match op.n() {
        0x0 => Instruction::Move { x, y },
        0x1 => Instruction::Or { x, y },
        0x2 => Instruction::And { x, y },
        0x3 => Instruction::Xor { x, y },
        0x4 => Instruction::Add { x, y },
        0x5 => Instruction::Sub { x, y },
        0x6 => Instruction::ShiftRight { x, y },
        0x7 => Instruction::SubReverse { x, y },
        0xE => Instruction::ShiftLeft { x, y },
        _ => return Err(DecodeError::InvalidOpcode(op.0)),
    };
    Ok(instruction)
}

/// 0xEX__: secondary dispatch on NN.
fn decode_keys(op: Opcode) -> Result<Instruction, DecodeError> {
    match op.nn() {
        0x9E => Ok(Instruction::SkipKeyDown { x: op.x() }),
        0xA1 => Ok(Instruction::SkipKeyUp { x: op.x() }),
        _ => Err(DecodeError::InvalidOpcode(op.0)),
    }
}

/// 0xFX__: secondary dispatch on NN.
fn decode_misc(op: Opcode) -> Result<Instruction, DecodeError> {
    let x = op.x();
    let instruction = match op.nn() {
        0x07 => Instruction::ReadDelay { x },
        0x0A => Instruction::WaitKey { x },
        0x15 => Instruction::SetDelay { x },
        0x18 => Instruction::SetSound { x },
        0x1E => Instruction::AddIndex { x },
        0x29 => Instruction::FontAddress { x },
        0x33 => Instruction::StoreBcd { x },
        0x55 => Instruction::StoreBlock { x },
        0x65 => Instruction::LoadBlock { x },
        _ => return Err(DecodeError::InvalidOpcode(op.0)),
    };
    Ok(instruction)
}

/// Encode an instruction back to its 16-bit opcode.
pub fn encode(instr: &Instruction) -> u16 {
    let xy = |class: u16, x: u8, y: u8, n: u16| class << 12 | (x as u16 & 0xF) << 8 | (y as u16 & 0xF) << 4 | n;
    let xnn = |class: u16, x: u8, nn: u8| class << 12 | (x as u16 & 0xF) << 8 | nn as u16;
    let fx = |x: u8, nn: u16| 0xF000 | (x as u16 & 0xF) << 8 | nn;

    match *instr {
        Instruction::Cls => 0x00E0,
        Instruction::Ret => 0x00EE,
        Instruction::Jump { addr } => 0x1000 | (addr & 0x0FFF),
        Instruction::Call { addr } => 0x2000 | (addr & 0x0FFF),
        Instruction::SkipEqImm { x, value } => xnn(0x3, x, value),
        Instruction::SkipNeImm { x, value } => xnn(0x4, x, value),
        Instruction::SkipEqReg { x, y } => xy(0x5, x, y, 0x0),
        Instruction::LoadImm { x, value } => xnn(0x6, x, value),
        Instruction::AddImm { x, value } => xnn(0x7, x, value),
        Instruction::Move { x, y } => xy(0x8, x, y, 0x0),
        Instruction::Or { x, y } => xy(0x8, x, y, 0x1),
        Instruction::And { x, y } => xy(0x8, x, y, 0x2),
        Instruction::Xor { x, y } => xy(0x8, x, y, 0x3),
        Instruction::Add { x, y } => xy(0x8, x, y, 0x4),
        Instruction::Sub { x, y } => xy(0x8, x, y, 0x5),
        Instruction::ShiftRight { x, y } => xy(0x8, x, y, 0x6),
        Instruction::SubReverse { x, y } => xy(0x8, x, y, 0x7),
        Instruction::ShiftLeft { x, y } => xy(0x8, x, y, 0xE),
        Instruction::SkipNeReg { x, y } => xy(0x9, x, y, 0x0),
        Instruction::LoadIndex { addr } => 0xA000 | (addr & 0x0FFF),
        Instruction::JumpOffset { addr } => 0xB000 | (addr & 0x0FFF),
        Instruction::Random { x, mask } => xnn(0xC, x, mask),
        Instruction::Draw { x, y, height } => xy(0xD, x, y, height as u16 & 0xF),
        Instruction::SkipKeyDown { x } => xnn(0xE, x, 0x9E),
        Instruction::SkipKeyUp { x } => xnn(0xE, x, 0xA1),
        Instruction::ReadDelay { x } => fx(x, 0x07),
        Instruction::WaitKey { x } => fx(x, 0x0A),
        Instruction::SetDelay { x } => fx(x, 0x15),
        Instruction::SetSound { x } => fx(x, 0x18),
        Instruction::AddIndex { x } => fx(x, 0x1E),
        Instruction::FontAddress { x } => fx(x, 0x29),
        Instruction::StoreBcd { x } => fx(x, 0x33),
        Instruction::StoreBlock { x } => fx(x, 0x55),
        Instruction::LoadBlock { x } => fx(x, 0x65),
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:#06X}")]
    InvalidOpcode(u16),
}
