//! # CHIP-8 Emulator
//!
//! An interpreter for the CHIP-8 virtual machine.
//!
//! The core in [`cpu`] owns the whole machine state and exposes a
//! single-step API. Everything that touches a real screen, keyboard,
//! speaker or file lives outside it: [`runner`] drives the engine at a
//! steady instruction rate with 60 Hz timers, and the optional [`tui`]
//! and [`wasm`] modules plug it into a terminal or a browser.

pub mod cpu;
pub mod config;
pub mod runner;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Framebuffer, Instruction, Keypad, Memory, Registers, SnapshotError};
pub use cpu::decode::{decode, encode};
pub use config::{Config, ConfigError};
pub use runner::{Frontend, HeadlessFrontend, InputState, RunError, Runner};

#[cfg(feature = "tui")]
pub use tui::run_terminal;
