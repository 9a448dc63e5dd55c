//! CHIP-8 registers.
//!
//! - V0..VF: sixteen 8-bit general registers, VF doubles as the flag output
//! - I: 16-bit index register, masked to 12 bits only when used as an address
//! - PC: 16-bit program counter
//! - the return stack, bounded to [`STACK_DEPTH`] entries

use serde::{Serialize, Deserialize};
use crate::cpu::memory::PROGRAM_START;

/// Maximum nesting of subroutine calls.
pub const STACK_DEPTH: usize = 16;

/// Index of the flag register.
pub const VF: usize = 0xF;

/// The CHIP-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// V0..VF
    pub v: [u8; 16],

    /// Index register
    pub i: u16,

    /// Program counter
    pub pc: u16,

    /// Return addresses, innermost call last
    pub stack: Vec<u16>,
}

impl Registers {
    /// Power-on register state: all zero, PC at the program start.
    pub fn new() -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            stack: Vec::with_capacity(STACK_DEPTH),
        }
    }

    /// Reset all registers to power-on state.
    pub fn reset(&mut self) {
        self.v = [0; 16];
        self.i = 0;
        self.pc = PROGRAM_START;
        self.stack.clear();
    }

    /// Set VF to 1 or 0, overwriting its previous value.
    #[inline]
    pub fn set_flag(&mut self, flag: bool) {
        self.v[VF] = flag as u8;
    }

    /// Move PC to the next instruction.
    #[inline]
    pub fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Move PC past the next instruction.
    #[inline]
    pub fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(4);
    }

    /// Set the program counter to an absolute address.
    #[inline]
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr;
    }

    /// Push a return address. Returns `false` if the stack is already full.
    pub fn push(&mut self, addr: u16) -> bool {
        if self.stack.len() >= STACK_DEPTH {
            return false;
        }
        self.stack.push(addr);
        true
    }

    /// Pop the innermost return address.
    pub fn pop(&mut self) -> Option<u16> {
        self.stack.pop()
    }

    /// Current call nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
