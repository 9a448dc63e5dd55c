//! Terminal frontend state and input handling.

use std::io::{self, Stdout, Write};
use std::time::Duration;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use crate::config::Config;
use crate::cpu::Cpu;
use crate::runner::{Frontend, InputState, RunError, Runner};

/// Conventional layout: the left block of a QWERTY keyboard.
///
/// ```text
/// 1 2 3 4      1 2 3 C
/// q w e r  ->  4 5 6 D
/// a s d f      7 8 9 E
/// z x c v      A 0 B F
/// ```
const KEYMAP: [(char, u8); 16] = [
    ('1', 0x1), ('2', 0x2), ('3', 0x3), ('4', 0xC),
    ('q', 0x4), ('w', 0x5), ('e', 0x6), ('r', 0xD),
    ('a', 0x7), ('s', 0x8), ('d', 0x9), ('f', 0xE),
    ('z', 0xA), ('x', 0x0), ('c', 0xB), ('v', 0xF),
];

/// Map a typed character to a hex key.
pub fn map_key(c: char) -> Option<u8> {
    let c = c.to_ascii_lowercase();
    KEYMAP.iter().find(|(k, _)| *k == c).map(|(_, hex)| *hex)
}

/// Holds keys down for a few frames after each press.
///
/// Terminals report presses (and auto-repeats) but usually not releases.
#[derive(Debug, Clone)]
pub struct KeyLatch {
    remaining: [u32; 16],
    hold_frames: u32,
}

impl KeyLatch {
    pub fn new(hold_frames: u32) -> Self {
        Self {
            remaining: [0; 16],
            hold_frames: hold_frames.max(1),
        }
    }

    pub fn press(&mut self, key: u8) {
        self.remaining[(key & 0xF) as usize] = self.hold_frames;
    }

    /// Keys currently down.
    pub fn keys(&self) -> [bool; 16] {
        self.remaining.map(|r| r > 0)
    }

    /// Age every held key by one frame.
    pub fn end_frame(&mut self) {
        for r in self.remaining.iter_mut() {
            *r = r.saturating_sub(1);
        }
    }
}

/// Terminal host: raw mode, alternate screen, ratatui drawing.
pub struct TerminalFrontend {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    latch: KeyLatch,
}

impl TerminalFrontend {
    /// Take over the terminal. It is restored on drop.
    pub fn new(hold_frames: u32) -> io::Result<Self> {
        enable_raw_mode()?;
        io::stdout().execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

        Ok(Self {
            terminal,
            latch: KeyLatch::new(hold_frames),
        })
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = io::stdout().execute(LeaveAlternateScreen);
    }
}

impl Frontend for TerminalFrontend {
    fn poll_input(&mut self) -> io::Result<InputState> {
        self.latch.end_frame();
        let mut quit = false;

        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind == KeyEventKind::Release {
                continue;
            }
            match key.code {
                KeyCode::Esc => quit = true,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => quit = true,
                KeyCode::Char(c) => {
                    if let Some(hex) = map_key(c) {
                        self.latch.press(hex);
                    }
                }
                _ => {}
            }
        }

        Ok(InputState {
            keys: self.latch.keys(),
            quit,
        })
    }

    fn render(&mut self, cpu: &Cpu) -> io::Result<()> {
        self.terminal.draw(|frame| {
            super::ui::draw(frame, cpu);
        })?;
        Ok(())
    }

    fn beep(&mut self) -> io::Result<()> {
        let backend = self.terminal.backend_mut();
        backend.write_all(b"\x07")?;
        Write::flush(backend)
    }
}

/// Run a program in the terminal until Esc or a fatal error.
pub fn run_terminal(program: &[u8], config: Config) -> Result<(), RunError> {
    let frontend = TerminalFrontend::new(config.key_hold_frames)?;
    let mut runner = Runner::new(config, frontend)?;
    runner.load(program)?;
    runner.run()
}
