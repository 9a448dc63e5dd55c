//! The 16-key hex keypad.

use serde::{Serialize, Deserialize};

/// Number of keys, 0x0 through 0xF.
pub const KEY_COUNT: usize = 16;

/// Pressed/released state of each hex key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the whole input vector.
    pub fn set_all(&mut self, keys: [bool; KEY_COUNT]) {
        self.keys = keys;
    }

    /// Set a single key. Only the low nibble of `key` is used.
    pub fn set(&mut self, key: u8, pressed: bool) {
        self.keys[(key & 0xF) as usize] = pressed;
    }

    /// Only the low nibble of `key` is used.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }

    /// Highest-numbered key currently held, if any.
    pub fn pressed_key(&self) -> Option<u8> {
        self.keys.iter().rposition(|k| *k).map(|k| k as u8)
    }

    pub fn as_array(&self) -> [bool; KEY_COUNT] {
        self.keys
    }
}
