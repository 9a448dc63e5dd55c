//! Host driving loop.
//!
//! One frame is: poll input, write the keypad, run a batch of steps sized
//! to the configured instruction rate, redraw if the screen changed, then
//! advance the timers by the real time that passed. Timers are driven by
//! wall-clock time only, never by the step count or the redraw.

use std::io;
use std::thread;
use std::time::{Duration, Instant};
use log::{info, warn};
use thiserror::Error;
use crate::config::{Config, ConfigError};
use crate::cpu::{Cpu, CpuError};

/// Input sampled once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    /// Pressed state of hex keys 0x0..=0xF.
    pub keys: [bool; 16],
    /// The user asked to stop.
    pub quit: bool,
}

/// The outside world as seen by the runner.
pub trait Frontend {
    /// Sample the keyboard.
    fn poll_input(&mut self) -> io::Result<InputState>;

    /// Show the current machine state.
    fn render(&mut self, cpu: &Cpu) -> io::Result<()>;

    /// The sound timer just ran out.
    fn beep(&mut self) -> io::Result<()>;
}

/// What happened during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Quit,
}

/// Drives a [`Cpu`] against a [`Frontend`].
pub struct Runner<F: Frontend> {
    pub cpu: Cpu,
    pub frontend: F,
    config: Config,
    frames: u64,
    /// Instruction credit left over from earlier frames, in units of
    /// 1/frame_hz instructions.
    step_credit: u64,
}

impl<F: Frontend> Runner<F> {
    /// Build a runner around a freshly powered-on machine.
    pub fn new(config: Config, frontend: F) -> Result<Self, RunError> {
        config.validate()?;
        let mut cpu = match config.seed {
            Some(seed) => Cpu::with_seed(seed),
            None => Cpu::new(),
        };
        cpu.set_timer_hz(config.timer_hz);

        Ok(Self {
            cpu,
            frontend,
            config,
            frames: 0,
            step_credit: 0,
        })
    }

    /// Install a program image.
    pub fn load(&mut self, program: &[u8]) -> Result<(), RunError> {
        self.cpu.install(program)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Steps owed this frame. The fractional part carries over, so over one
    /// second of frames exactly `instructions_per_second` steps run.
    fn steps_due(&mut self) -> u64 {
        let frame_hz = u64::from(self.config.frame_hz);
        self.step_credit += u64::from(self.config.instructions_per_second);
        let due = self.step_credit / frame_hz;
        self.step_credit %= frame_hz;
        due
    }

    /// Run one frame, treating `elapsed` as the real time since the last.
    pub fn run_frame(&mut self, elapsed: Duration) -> Result<FrameOutcome, RunError> {
        let input = self.frontend.poll_input()?;
        if input.quit {
            return Ok(FrameOutcome::Quit);
        }
        self.cpu.set_keys(input.keys);

        for _ in 0..self.steps_due() {
            self.cpu.step()?;
        }

        if self.cpu.take_display_dirty() {
            self.frontend.render(&self.cpu)?;
        }

        let edges = self.cpu.update_timers(elapsed);
        if self.config.sound {
            for _ in 0..edges {
                self.frontend.beep()?;
            }
        }

        self.frames += 1;
        Ok(FrameOutcome::Continue)
    }

    /// Run frames at the configured frame rate until the frontend quits or
    /// the machine faults.
    pub fn run(&mut self) -> Result<(), RunError> {
        let frame = Duration::from_secs(1) / self.config.frame_hz;
        info!(
            "running at {} instructions/s, {} frames/s",
            self.config.instructions_per_second, self.config.frame_hz
        );

        let mut last = Instant::now();
        loop {
            let started = Instant::now();
            let elapsed = started - last;
            last = started;

            match self.run_frame(elapsed) {
                Ok(FrameOutcome::Continue) => {}
                Ok(FrameOutcome::Quit) => {
                    info!("stopped after {} frames", self.frames);
                    return Ok(());
                }
                Err(e) => {
                    warn!("stopped after {} frames: {}", self.frames, e);
                    return Err(e);
                }
            }

            if let Some(rest) = frame.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
    }
}

/// Errors that stop the run loop.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Cpu(#[from] CpuError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("frontend error: {0}")]
    Io(#[from] io::Error),
}

/// A frontend with no screen: keys are set directly, renders and beeps
/// are only counted.
#[derive(Debug, Default)]
pub struct HeadlessFrontend {
    pub keys: [bool; 16],
    /// Request a quit once this many frames have been polled.
    pub quit_after: Option<u64>,
    pub polls: u64,
    pub renders: u64,
    pub beeps: u64,
}

impl HeadlessFrontend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Frontend for HeadlessFrontend {
    fn poll_input(&mut self) -> io::Result<InputState> {
        self.polls += 1;
        let quit = self.quit_after.map_or(false, |n| self.polls > n);
        Ok(InputState { keys: self.keys, quit })
    }

    fn render(&mut self, _cpu: &Cpu) -> io::Result<()> {
        self.renders += 1;
        Ok(())
    }

    fn beep(&mut self) -> io::Result<()> {
        self.beeps += 1;
        Ok(())
    }
}
