//! CPU emulation for CHIP-8.
//!
//! This module implements the complete CHIP-8 machine:
//! - 4 KiB of memory with the hex font at 0x000
//! - 16 8-bit registers, a 16-bit index register and a return stack
//! - delay and sound timers counting down at 60 Hz
//! - a 64x32 monochrome framebuffer and a 16-key keypad
//! - the 35-instruction set with fatal errors for anything undefined

pub mod memory;
pub mod registers;
pub mod display;
pub mod keypad;
pub mod timers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::Registers;
pub use display::Framebuffer;
pub use keypad::Keypad;
pub use timers::{Timers, TimerClock, TimerEvent};
pub use decode::{Instruction, DecodeError};
pub use execute::{Cpu, CpuError, CpuState, SnapshotError};
