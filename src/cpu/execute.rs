//! CPU execution engine for CHIP-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::{Framebuffer, Keypad, Memory, Registers, Timers};
use crate::cpu::decode::{self, Instruction, DecodeError};
use crate::cpu::display::{HEIGHT, WIDTH};
use crate::cpu::memory::{MemoryError, FONT_ADDR, FONT_GLYPH_SIZE, MEMORY_SIZE};
use crate::cpu::registers::{STACK_DEPTH, VF};
use crate::cpu::timers::{TimerClock, TimerEvent};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};
use std::time::Duration;
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// Fx0A is waiting for a key; PC stays on the Fx0A instruction.
    AwaitingKey { register: u8 },
    /// CPU hit a fatal error and will not step again until reset.
    Faulted,
}

/// Where the program counter goes after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Skip,
    Jump(u16),
    Block,
}

impl Flow {
    fn skip_if(cond: bool) -> Self {
        if cond { Flow::Skip } else { Flow::Next }
    }
}

fn fresh_rng() -> StdRng {
    StdRng::from_entropy()
}

/// The CHIP-8 machine.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers and call stack.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Display output.
    pub display: Framebuffer,
    /// Input vector, written by the host before stepping.
    pub keypad: Keypad,
    /// Delay and sound timers.
    pub timers: Timers,
    /// Current execution state.
    pub state: CpuState,
    /// Step count (for profiling).
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
    /// Set whenever the framebuffer changes, cleared by the host.
    #[serde(skip)]
    display_dirty: bool,
    #[serde(skip)]
    clock: TimerClock,
    #[serde(skip, default = "fresh_rng")]
    rng: StdRng,
}

impl Cpu {
    /// Create a powered-on machine with an entropy-seeded random source.
    pub fn new() -> Self {
        Self::with_rng(fresh_rng())
    }

    /// Create a machine whose Cxnn results are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            display: Framebuffer::new(),
            keypad: Keypad::new(),
            timers: Timers::new(),
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
            display_dirty: true,
            clock: TimerClock::default(),
            rng,
        }
    }

    /// Use a different timer rate for [`Cpu::update_timers`].
    pub fn set_timer_hz(&mut self, hz: u32) {
        self.clock = TimerClock::new(hz);
    }

    /// Reset the machine to power-on state. Memory is cleared too.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.display.clear();
        self.keypad = Keypad::new();
        self.timers = Timers::new();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
        self.display_dirty = true;
        debug!("machine reset");
    }

    /// Load a program image at 0x200.
    pub fn install(&mut self, program: &[u8]) -> Result<(), CpuError> {
        self.mem.load_program(program)?;
        debug!("installed {} byte program at {:#05X}", program.len(), self.regs.pc);
        Ok(())
    }

    /// Execute a single instruction.
    ///
    /// While awaiting a key this only polls the keypad. Returns the
    /// instruction that was (re)executed, or a fatal error.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        if let CpuState::AwaitingKey { register } = self.state {
            self.cycles += 1;
            self.resume_if_key(register);
            return Ok(Instruction::WaitKey { x: register });
        }
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let pc = self.regs.pc;
        let word = self.mem.read_word(pc);

        // Decode
        let instr = match decode::decode(word) {
            Ok(instr) => instr,
            Err(source) => return Err(self.fault(CpuError::Decode { pc, source })),
        };
        trace!("{:#05X}: {:04X} {:?}", pc, word, instr);

        // Execute
        let flow = match self.execute(instr) {
            Ok(flow) => flow,
            Err(e) => return Err(self.fault(e)),
        };

        match flow {
            Flow::Next => self.regs.advance_pc(),
            Flow::Skip => self.regs.skip(),
            Flow::Jump(addr) => self.regs.jump(addr),
            Flow::Block => {}
        }

        // Update state
        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(instr)
    }

    /// Step until `max_cycles` instructions have run or an error occurs.
    ///
    /// Returns the number of steps taken.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    fn fault(&mut self, err: CpuError) -> CpuError {
        warn!("execution halted: {}", err);
        self.state = CpuState::Faulted;
        err
    }

    fn resume_if_key(&mut self, register: u8) {
        if let Some(key) = self.keypad.pressed_key() {
            debug!("key {:X} released wait into V{:X}", key, register);
            self.set_vx(register, key);
            self.regs.advance_pc();
            self.state = CpuState::Running;
        }
    }

    /// Execute a decoded instruction against the machine state.
    fn execute(&mut self, instr: Instruction) -> Result<Flow, CpuError> {
        let flow = match instr {
            // ==================== Flow ====================

            Instruction::Cls => {
                self.display.clear();
                self.display_dirty = true;
                Flow::Next
            }

            Instruction::Ret => {
                let ret = self.regs.pop()
                    .ok_or(CpuError::StackUnderflow { pc: self.regs.pc })?;
                Flow::Jump(ret.wrapping_add(2))
            }

            Instruction::Jump { nnn } => Flow::Jump(nnn),

            Instruction::Call { nnn } => {
                if !self.regs.push(self.regs.pc) {
                    return Err(CpuError::StackOverflow {
                        pc: self.regs.pc,
                        depth: STACK_DEPTH,
                    });
                }
                Flow::Jump(nnn)
            }

            Instruction::JumpV0 { nnn } => Flow::Jump(nnn + self.regs.v[0] as u16),

            // ==================== Skips ====================

            Instruction::SkipEqImm { x, nn } => Flow::skip_if(self.vx(x) == nn),
            Instruction::SkipNeImm { x, nn } => Flow::skip_if(self.vx(x) != nn),
            Instruction::SkipEqReg { x, y } => Flow::skip_if(self.vx(x) == self.vx(y)),
            Instruction::SkipNeReg { x, y } => Flow::skip_if(self.vx(x) != self.vx(y)),
            Instruction::SkipKey { x } => Flow::skip_if(self.keypad.is_pressed(self.vx(x))),
            Instruction::SkipNotKey { x } => Flow::skip_if(!self.keypad.is_pressed(self.vx(x))),

            // ==================== Registers & ALU ====================

            Instruction::LoadImm { x, nn } => {
                self.set_vx(x, nn);
                Flow::Next
            }

            Instruction::AddImm { x, nn } => {
                self.set_vx(x, self.vx(x).wrapping_add(nn));
                Flow::Next
            }

            Instruction::Move { x, y } => {
                self.set_vx(x, self.vx(y));
                Flow::Next
            }

            Instruction::Or { x, y } => {
                self.set_vx(x, self.vx(x) | self.vx(y));
                Flow::Next
            }

            Instruction::And { x, y } => {
                self.set_vx(x, self.vx(x) & self.vx(y));
                Flow::Next
            }

            Instruction::Xor { x, y } => {
                self.set_vx(x, self.vx(x) ^ self.vx(y));
                Flow::Next
            }

            // The flag is written after Vx so that VF as a destination
            // still ends up holding the flag.
            Instruction::Add { x, y } => {
                let (sum, carry) = self.vx(x).overflowing_add(self.vx(y));
                self.set_vx(x, sum);
                self.regs.set_flag(carry);
                Flow::Next
            }

            Instruction::Sub { x, y } => {
                let (vx, vy) = (self.vx(x), self.vx(y));
                self.set_vx(x, vx.wrapping_sub(vy));
                self.regs.set_flag(vx >= vy);
                Flow::Next
            }

            Instruction::Shr { x, .. } => {
                let vx = self.vx(x);
                self.set_vx(x, vx >> 1);
                self.regs.set_flag(vx & 0x01 != 0);
                Flow::Next
            }

            Instruction::SubN { x, y } => {
                let (vx, vy) = (self.vx(x), self.vx(y));
                self.set_vx(x, vy.wrapping_sub(vx));
                self.regs.set_flag(vy >= vx);
                Flow::Next
            }

            Instruction::Shl { x, .. } => {
                let vx = self.vx(x);
                self.set_vx(x, vx << 1);
                self.regs.set_flag(vx & 0x80 != 0);
                Flow::Next
            }

            Instruction::Random { x, nn } => {
                let byte: u8 = self.rng.gen();
                self.set_vx(x, byte & nn);
                Flow::Next
            }

            // ==================== Index & memory ====================

            Instruction::LoadIndex { nnn } => {
                self.regs.i = nnn;
                Flow::Next
            }

            Instruction::AddIndex { x } => {
                self.regs.i = self.regs.i.wrapping_add(self.vx(x) as u16);
                Flow::Next
            }

            Instruction::FontChar { x } => {
                self.regs.i = FONT_ADDR + (self.vx(x) as u16) * FONT_GLYPH_SIZE;
                Flow::Next
            }

            Instruction::Bcd { x } => {
                let vx = self.vx(x);
                let i = self.regs.i;
                self.mem.write(i, vx / 100);
                self.mem.write(i.wrapping_add(1), (vx / 10) % 10);
                self.mem.write(i.wrapping_add(2), vx % 10);
                Flow::Next
            }

            Instruction::StoreRegs { x } => {
                let i = self.regs.i;
                for offset in 0..=x {
                    let value = self.vx(offset);
                    self.mem.write(i.wrapping_add(offset as u16), value);
                }
                Flow::Next
            }

            Instruction::LoadRegs { x } => {
                let i = self.regs.i;
                for offset in 0..=x {
                    let value = self.mem.read(i.wrapping_add(offset as u16));
                    self.set_vx(offset, value);
                }
                Flow::Next
            }

            // ==================== Display ====================

            Instruction::Draw { x, y, n } => {
                let sprite = self.mem.read_range(self.regs.i, n as usize);
                let col = self.vx(x) as usize % WIDTH;
                let row = self.vx(y) as usize % HEIGHT;
                self.regs.set_flag(false);
                let collision = self.display.draw_sprite(col, row, &sprite);
                self.regs.set_flag(collision);
                self.display_dirty = true;
                Flow::Next
            }

            // ==================== Timers & input ====================

            Instruction::GetDelay { x } => {
                self.set_vx(x, self.timers.delay);
                Flow::Next
            }

            Instruction::WaitKey { x } => match self.keypad.pressed_key() {
                Some(key) => {
                    self.set_vx(x, key);
                    Flow::Next
                }
                None => {
                    debug!("waiting for key into V{:X}", x);
                    self.state = CpuState::AwaitingKey { register: x };
                    Flow::Block
                }
            },

            Instruction::SetDelay { x } => {
                self.timers.delay = self.vx(x);
                Flow::Next
            }

            Instruction::SetSound { x } => {
                self.timers.sound = self.vx(x);
                Flow::Next
            }
        };

        Ok(flow)
    }

    #[inline]
    fn vx(&self, x: u8) -> u8 {
        self.regs.v[(x & 0xF) as usize]
    }

    #[inline]
    fn set_vx(&mut self, x: u8, value: u8) {
        self.regs.v[(x & 0xF) as usize] = value;
    }

    /// Apply one timer decrement.
    pub fn tick_timers(&mut self) -> Option<TimerEvent> {
        self.timers.tick()
    }

    /// Apply as many timer decrements as `elapsed` wall-clock time is worth.
    ///
    /// Returns the number of sound turn-off edges seen (0 or 1 in practice).
    pub fn update_timers(&mut self, elapsed: Duration) -> usize {
        let due = self.clock.advance(elapsed);
        (0..due)
            .filter_map(|_| self.timers.tick())
            .filter(|e| *e == TimerEvent::SoundOff)
            .count()
    }

    /// Overwrite the whole input vector.
    pub fn set_keys(&mut self, keys: [bool; 16]) {
        self.keypad.set_all(keys);
    }

    /// Read-only view of the framebuffer.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.display
    }

    /// Read-only view of V0..VF.
    pub fn registers(&self) -> &[u8; 16] {
        &self.regs.v
    }

    /// True if the framebuffer changed since the last call; clears the flag.
    pub fn take_display_dirty(&mut self) -> bool {
        std::mem::take(&mut self.display_dirty)
    }

    /// True while the sound timer is non-zero.
    pub fn sound_active(&self) -> bool {
        self.timers.sound_active()
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is blocked on Fx0A.
    pub fn is_awaiting_key(&self) -> bool {
        matches!(self.state, CpuState::AwaitingKey { .. })
    }

    /// Check if the CPU hit a fatal error.
    pub fn is_faulted(&self) -> bool {
        self.state == CpuState::Faulted
    }

    /// Serialize the machine state to JSON.
    pub fn snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Rebuild a machine from [`Cpu::snapshot`] output.
    ///
    /// Well-formed JSON describing an impossible machine is rejected.
    pub fn restore(json: &str) -> Result<Self, SnapshotError> {
        let mut cpu: Cpu = serde_json::from_str(json)?;
        cpu.check_shape()?;
        cpu.display_dirty = true;
        Ok(cpu)
    }

    fn check_shape(&self) -> Result<(), SnapshotError> {
        if self.mem.as_slice().len() != MEMORY_SIZE {
            return Err(SnapshotError::MemorySize(self.mem.as_slice().len()));
        }
        if self.display.as_slice().len() != WIDTH * HEIGHT {
            return Err(SnapshotError::FramebufferSize(self.display.as_slice().len()));
        }
        if self.regs.depth() > STACK_DEPTH {
            return Err(SnapshotError::StackDepth(self.regs.depth()));
        }
        if let CpuState::AwaitingKey { register } = self.state {
            if register > 0xF {
                return Err(SnapshotError::WaitRegister(register));
            }
        }
        Ok(())
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
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("timers", &self.timers)
            .finish()
    }
}

/// Errors that can occur during CPU execution. All of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("{source} at PC={pc:#05X}")]
    Decode { pc: u16, source: DecodeError },

    #[error("stack underflow: return with empty call stack at PC={pc:#05X}")]
    StackUnderflow { pc: u16 },

    #[error("stack overflow: call nesting exceeds {depth} at PC={pc:#05X}")]
    StackOverflow { pc: u16, depth: usize },
}

/// Reasons a snapshot cannot be restored.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot memory holds {} bytes, expected {}", .0, MEMORY_SIZE)]
    MemorySize(usize),

    #[error("snapshot framebuffer holds {} cells, expected {}", .0, WIDTH * HEIGHT)]
    FramebufferSize(usize),

    #[error("snapshot call stack is {} deep, limit is {}", .0, STACK_DEPTH)]
    StackDepth(usize),

    #[error("snapshot waits for a key into V{0}, which does not exist")]
    WaitRegister(u8),
}

impl CpuError {
    /// The raw opcode, for decode failures.
    pub fn opcode(&self) -> Option<u16> {
        match self {
            CpuError::Decode { source: DecodeError::UnknownOpcode(word), .. } => Some(*word),
            _ => None,
        }
    }
}
