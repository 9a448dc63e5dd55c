//! Instruction decoder for CHIP-8.
//!
//! Every instruction is one big-endian 16-bit word. The top nibble picks the
//! family; some families are further split on the low nibble or low byte.
//! Operand fields:
//! - `x`   = bits 8-11, a register index
//! - `y`   = bits 4-7, a register index
//! - `n`   = bits 0-3
//! - `nn`  = bits 0-7
//! - `nnn` = bits 0-11, an address

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Decoded CHIP-8 instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Flow ====================

    /// 00E0: clear the screen
    Cls,

    /// 00EE: return from subroutine
    Ret,

    /// 1nnn: PC := nnn
    Jump { nnn: u16 },

    /// 2nnn: push PC, PC := nnn
    Call { nnn: u16 },

    /// Bnnn: PC := nnn + V0
    JumpV0 { nnn: u16 },

    // ==================== Skips ====================

    /// 3xnn: skip if Vx == nn
    SkipEqImm { x: u8, nn: u8 },

    /// 4xnn: skip if Vx != nn
    SkipNeImm { x: u8, nn: u8 },

    /// 5xy0: skip if Vx == Vy
    SkipEqReg { x: u8, y: u8 },

    /// 9xy0: skip if Vx != Vy
    SkipNeReg { x: u8, y: u8 },

    /// Ex9E: skip if key Vx is down
    SkipKey { x: u8 },

    /// ExA1: skip if key Vx is up
    SkipNotKey { x: u8 },

    // ==================== Registers & ALU ====================

    /// 6xnn: Vx := nn
    LoadImm { x: u8, nn: u8 },

    /// 7xnn: Vx := Vx + nn, no flag
    AddImm { x: u8, nn: u8 },

    /// 8xy0: Vx := Vy
    Move { x: u8, y: u8 },

    /// 8xy1: Vx := Vx | Vy
    Or { x: u8, y: u8 },

    /// 8xy2: Vx := Vx & Vy
    And { x: u8, y: u8 },

    /// 8xy3: Vx := Vx ^ Vy
    Xor { x: u8, y: u8 },

    /// 8xy4: Vx := Vx + Vy, VF := carry
    Add { x: u8, y: u8 },

    /// 8xy5: Vx := Vx - Vy, VF := not borrow
    Sub { x: u8, y: u8 },

    /// 8xy6: VF := low bit, Vx := Vx >> 1
    Shr { x: u8, y: u8 },

    /// 8xy7: Vx := Vy - Vx, VF := not borrow
    SubN { x: u8, y: u8 },

    /// 8xyE: VF := high bit, Vx := Vx << 1
    Shl { x: u8, y: u8 },

    /// Cxnn: Vx := random & nn
    Random { x: u8, nn: u8 },

    // ==================== Index & memory ====================

    /// Annn: I := nnn
    LoadIndex { nnn: u16 },

    /// Fx1E: I := I + Vx
    AddIndex { x: u8 },

    /// Fx29: I := address of font glyph Vx
    FontChar { x: u8 },

    /// Fx33: BCD of Vx at I, I+1, I+2
    Bcd { x: u8 },

    /// Fx55: store V0..=Vx at I
    StoreRegs { x: u8 },

    /// Fx65: load V0..=Vx from I
    LoadRegs { x: u8 },

    // ==================== Display ====================

    /// Dxyn: draw n-row sprite from I at (Vx, Vy), VF := collision
    Draw { x: u8, y: u8, n: u8 },

    // ==================== Timers & input ====================

    /// Fx07: Vx := delay timer
    GetDelay { x: u8 },

    /// Fx0A: block until a key is down, Vx := key
    WaitKey { x: u8 },

    /// Fx15: delay timer := Vx
    SetDelay { x: u8 },

    /// Fx18: sound timer := Vx
    SetSound { x: u8 },
}

#[inline]
fn x_of(word: u16) -> u8 {
    ((word >> 8) & 0xF) as u8
}

#[inline]
fn y_of(word: u16) -> u8 {
    ((word >> 4) & 0xF) as u8
}

#[inline]
fn n_of(word: u16) -> u8 {
    (word & 0xF) as u8
}

#[inline]
fn nn_of(word: u16) -> u8 {
    (word & 0xFF) as u8
}

#[inline]
fn nnn_of(word: u16) -> u16 {
    word & 0x0FFF
}

/// Decode a 16-bit instruction word.
///
/// Patterns that match no defined instruction are rejected, including
/// 5xy_/9xy_ with a non-zero low nibble and 0nnn machine-code calls.
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    let x = x_of(word);
    let y = y_of(word);

    let instruction = match word & 0xF000 {
        0x0000 => match word {
            0x00E0 => Instruction::Cls,
            0x00EE => Instruction::Ret,
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        0x1000 => Instruction::Jump { nnn: nnn_of(word) },
        0x2000 => Instruction::Call { nnn: nnn_of(word) },
        0x3000 => Instruction::SkipEqImm { x, nn: nn_of(word) },
        0x4000 => Instruction::SkipNeImm { x, nn: nn_of(word) },
        0x5000 if n_of(word) == 0 => Instruction::SkipEqReg { x, y },
        0x6000 => Instruction::LoadImm { x, nn: nn_of(word) },
        0x7000 => Instruction::AddImm { x, nn: nn_of(word) },
        0x8000 => match n_of(word) {
            0x0 => Instruction::Move { x, y },
            0x1 => Instruction::Or { x, y },
            0x2 => Instruction::And { x, y },
            0x3 => Instruction::Xor { x, y },
            0x4 => Instruction::Add { x, y },
            0x5 => Instruction::Sub { x, y },
            0x6 => Instruction::Shr { x, y },
            0x7 => Instruction::SubN { x, y },
            0xE => Instruction::Shl { x, y },
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        0x9000 if n_of(word) == 0 => Instruction::SkipNeReg { x, y },
        0xA000 => Instruction::LoadIndex { nnn: nnn_of(word) },
        0xB000 => Instruction::JumpV0 { nnn: nnn_of(word) },
        0xC000 => Instruction::Random { x, nn: nn_of(word) },
        0xD000 => Instruction::Draw { x, y, n: n_of(word) },
        0xE000 => match nn_of(word) {
            0x9E => Instruction::SkipKey { x },
            0xA1 => Instruction::SkipNotKey { x },
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        0xF000 => match nn_of(word) {
            0x07 => Instruction::GetDelay { x },
            0x0A => Instruction::WaitKey { x },
            0x15 => Instruction::SetDelay { x },
            0x18 => Instruction::SetSound { x },
            0x1E => Instruction::AddIndex { x },
            0x29 => Instruction::FontChar { x },
            0x33 => Instruction::Bcd { x },
            0x55 => Instruction::StoreRegs { x },
            0x65 => Instruction::LoadRegs { x },
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        _ => return Err(DecodeError::UnknownOpcode(word)),
    };

    Ok(instruction)
}

/// Encode an instruction back to its 16-bit word.
///
/// Register and nibble fields are masked to 4 bits, addresses to 12.
pub fn encode(instr: &Instruction) -> u16 {
    fn xnn(op: u16, x: u8, nn: u8) -> u16 {
        op | ((x as u16 & 0xF) << 8) | nn as u16
    }
    fn xy(op: u16, x: u8, y: u8, n: u8) -> u16 {
        op | ((x as u16 & 0xF) << 8) | ((y as u16 & 0xF) << 4) | (n as u16 & 0xF)
    }
    fn addr(op: u16, nnn: u16) -> u16 {
        op | (nnn & 0x0FFF)
    }

    match *instr {
        Instruction::Cls => 0x00E0,
        Instruction::Ret => 0x00EE,
        Instruction::Jump { nnn } => addr(0x1000, nnn),
        Instruction::Call { nnn } => addr(0x2000, nnn),
        Instruction::JumpV0 { nnn } => addr(0xB000, nnn),
        Instruction::LoadIndex { nnn } => addr(0xA000, nnn),

        Instruction::SkipEqImm { x, nn } => xnn(0x3000, x, nn),
        Instruction::SkipNeImm { x, nn } => xnn(0x4000, x, nn),
        Instruction::LoadImm { x, nn } => xnn(0x6000, x, nn),
        Instruction::AddImm { x, nn } => xnn(0x7000, x, nn),
        Instruction::Random { x, nn } => xnn(0xC000, x, nn),

        Instruction::SkipEqReg { x, y } => xy(0x5000, x, y, 0x0),
        Instruction::SkipNeReg { x, y } => xy(0x9000, x, y, 0x0),
        Instruction::Move { x, y } => xy(0x8000, x, y, 0x0),
        Instruction::Or { x, y } => xy(0x8000, x, y, 0x1),
        Instruction::And { x, y } => xy(0x8000, x, y, 0x2),
        Instruction::Xor { x, y } => xy(0x8000, x, y, 0x3),
        Instruction::Add { x, y } => xy(0x8000, x, y, 0x4),
        Instruction::Sub { x, y } => xy(0x8000, x, y, 0x5),
        Instruction::Shr { x, y } => xy(0x8000, x, y, 0x6),
        Instruction::SubN { x, y } => xy(0x8000, x, y, 0x7),
        Instruction::Shl { x, y } => xy(0x8000, x, y, 0xE),
        Instruction::Draw { x, y, n } => xy(0xD000, x, y, n),

        Instruction::SkipKey { x } => xnn(0xE000, x, 0x9E),
        Instruction::SkipNotKey { x } => xnn(0xE000, x, 0xA1),
        Instruction::GetDelay { x } => xnn(0xF000, x, 0x07),
        Instruction::WaitKey { x } => xnn(0xF000, x, 0x0A),
        Instruction::SetDelay { x } => xnn(0xF000, x, 0x15),
        Instruction::SetSound { x } => xnn(0xF000, x, 0x18),
        Instruction::AddIndex { x } => xnn(0xF000, x, 0x1E),
        Instruction::FontChar { x } => xnn(0xF000, x, 0x29),
        Instruction::Bcd { x } => xnn(0xF000, x, 0x33),
        Instruction::StoreRegs { x } => xnn(0xF000, x, 0x55),
        Instruction::LoadRegs { x } => xnn(0xF000, x, 0x65),
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode {0:#06X}")]
    UnknownOpcode(u16),
}
