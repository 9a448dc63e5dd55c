//! WebAssembly bindings for the CHIP-8 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.
//! The page owns the render loop, keyboard and audio; it calls `run` and
//! `tick_timers` on its own schedule.

use wasm_bindgen::prelude::*;
use crate::{Cpu, CpuState};
use crate::cpu::display::{HEIGHT, WIDTH};
use crate::cpu::TimerEvent;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
    program: Vec<u8>,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new machine. A seed makes Cxnn reproducible.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u64>) -> Self {
        let cpu = match seed {
            Some(seed) => Cpu::with_seed(seed),
            None => Cpu::new(),
        };
        Self {
            cpu,
            program: Vec::new(),
        }
    }

    /// Load a program image, resetting the machine first.
    #[wasm_bindgen]
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<usize, JsError> {
        self.cpu.reset();
        self.cpu.install(bytes)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.program = bytes.to_vec();
        Ok(bytes.len())
    }

    /// Step one instruction. Returns the executed instruction as text.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let instr = self.cpu.step()
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(format!("{:?}", instr))
    }

    /// Run up to `count` instructions. Returns the total step count.
    #[wasm_bindgen]
    pub fn run(&mut self, count: u32) -> Result<u64, JsError> {
        self.cpu.run_limited(count as u64)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(self.cpu.cycles)
    }

    /// One 60 Hz timer tick. Returns true on the sound turn-off edge.
    #[wasm_bindgen]
    pub fn tick_timers(&mut self) -> bool {
        self.cpu.tick_timers() == Some(TimerEvent::SoundOff)
    }

    /// Press or release a hex key.
    #[wasm_bindgen]
    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.cpu.keypad.set(key, pressed);
    }

    /// Reset to the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.cpu.reset();
        if !self.program.is_empty() {
            self.cpu.install(&self.program)
                .map_err(|e| JsError::new(&e.to_string()))?;
        }
        Ok(())
    }

    /// Framebuffer as one byte (0 or 1) per pixel, row-major.
    #[wasm_bindgen]
    pub fn framebuffer(&self) -> Vec<u8> {
        self.cpu.framebuffer().as_slice().iter().map(|on| *on as u8).collect()
    }

    /// True if the framebuffer changed since the last call.
    #[wasm_bindgen]
    pub fn take_dirty(&mut self) -> bool {
        self.cpu.take_display_dirty()
    }

    #[wasm_bindgen]
    pub fn width(&self) -> usize {
        WIDTH
    }

    #[wasm_bindgen]
    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// Check if the sound timer is running.
    #[wasm_bindgen]
    pub fn sound_active(&self) -> bool {
        self.cpu.sound_active()
    }

    /// Check if the CPU hit a fatal error.
    #[wasm_bindgen]
    pub fn is_faulted(&self) -> bool {
        self.cpu.state == CpuState::Faulted
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.cpu.regs.pc
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state)
    }

    /// Registers, index, timers and state as a JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> String {
        serde_json::json!({
            "v": self.cpu.regs.v,
            "i": self.cpu.regs.i,
            "pc": self.cpu.regs.pc,
            "stack": self.cpu.regs.stack,
            "delay": self.cpu.timers.delay,
            "sound": self.cpu.timers.sound,
            "state": format!("{:?}", self.cpu.state),
            "cycles": self.cpu.cycles,
        })
        .to_string()
    }

    /// Full machine snapshot as JSON.
    #[wasm_bindgen]
    pub fn snapshot(&self) -> Result<String, JsError> {
        self.cpu.snapshot().map_err(|e| JsError::new(&e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_reinstalls_program() {
        let mut wasm = WasmCpu::new(Some(1));
        // V0 = 0x42; jump self
        assert!(matches!(wasm.load_rom(&[0x60, 0x42, 0x12, 0x02]), Ok(4)));
        assert!(wasm.run(3).is_ok());
        assert_eq!(wasm.pc(), 0x202);

        assert!(wasm.reset().is_ok());
        assert_eq!(wasm.pc(), 0x200);
        assert_eq!(wasm.cpu.mem.read(0x200), 0x60);
        assert!(!wasm.is_faulted());
    }

    #[test]
    fn test_reset_without_program() {
        let mut wasm = WasmCpu::new(Some(1));
        assert!(wasm.reset().is_ok());
        assert_eq!(wasm.pc(), 0x200);
    }
}
