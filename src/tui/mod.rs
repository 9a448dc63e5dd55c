//! Terminal frontend for the CHIP-8 emulator.
//!
//! Provides a crossterm/ratatui host with:
//! - half-block rendering of the 64x32 framebuffer
//! - QWERTY keyboard mapping onto the hex keypad
//! - the terminal bell for sound

mod app;
mod ui;

pub use app::{KeyLatch, TerminalFrontend, map_key, run_terminal};
