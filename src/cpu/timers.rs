//! Delay and sound timers.
//!
//! Both count down toward zero at a fixed real-time rate, independent of
//! how many instructions run. [`TimerClock`] turns elapsed wall-clock time
//! into a whole number of ticks.

use std::time::Duration;
use serde::{Serialize, Deserialize};

/// Standard timer frequency.
pub const TIMER_HZ: u32 = 60;

/// Something the host should react to after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The sound timer just went from 1 to 0.
    SoundOff,
}

/// The two 8-bit countdown timers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decrement each non-zero timer by one.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        self.delay = self.delay.saturating_sub(1);

        if self.sound > 0 {
            self.sound -= 1;
            if self.sound == 0 {
                return Some(TimerEvent::SoundOff);
            }
        }
        None
    }

    /// True while the sound timer is counting.
    pub fn sound_active(&self) -> bool {
        self.sound > 0
    }
}

/// Converts elapsed time into timer ticks, carrying the remainder.
#[derive(Clone, Debug)]
pub struct TimerClock {
    period: Duration,
    pending: Duration,
}

impl TimerClock {
    /// A clock that ticks `hz` times per second. `hz` must be non-zero.
    pub fn new(hz: u32) -> Self {
        Self {
            period: Duration::from_secs(1) / hz.max(1),
            pending: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Account for `elapsed` time and return how many ticks are now due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.pending += elapsed;
        let mut due = 0;
        while self.pending >= self.period {
            self.pending -= self.period;
            due += 1;
        }
        due
    }
}

impl Default for TimerClock {
    fn default() -> Self {
        Self::new(TIMER_HZ)
    }
}
