//! Host configuration.
//!
//! Values come from defaults, optionally a JSON file, then command-line
//! overrides. The engine itself never reads these; the runner and
//! frontends do.

use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::cpu::timers::TIMER_HZ;

/// Emulator host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target instruction throughput.
    pub instructions_per_second: u32,
    /// Rate at which the delay and sound timers count down.
    pub timer_hz: u32,
    /// How often input is polled and the screen redrawn.
    pub frame_hz: u32,
    /// Fixed seed for Cxnn; entropy when absent.
    pub seed: Option<u64>,
    /// Frames a key stays down after the terminal reports a press.
    pub key_hold_frames: u32,
    /// Ring the terminal bell when the sound timer expires.
    pub sound: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instructions_per_second: 700,
            timer_hz: TIMER_HZ,
            frame_hz: 60,
            seed: None,
            key_hold_frames: 6,
            sound: true,
        }
    }
}

impl Config {
    /// Load settings from a JSON file. Missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
        Self::from_json(&text)
    }

    /// Parse settings from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runner cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instructions_per_second == 0 {
            return Err(ConfigError::ZeroRate("instructions_per_second"));
        }
        if self.timer_hz == 0 {
            return Err(ConfigError::ZeroRate("timer_hz"));
        }
        if self.frame_hz == 0 {
            return Err(ConfigError::ZeroRate("frame_hz"));
        }
        Ok(())
    }
}

/// Errors from loading or validating a [`Config`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cannot read config {0}: {1}")]
    Io(String, String),

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("{0} must be greater than zero")]
    ZeroRate(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timer_hz, 60);
        assert_eq!(config.instructions_per_second, 700);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"instructions_per_second": 1200, "seed": 42}"#).unwrap();
        assert_eq!(config.instructions_per_second, 1200);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.frame_hz, 60);
        assert!(config.sound);
    }

    #[test]
    fn test_zero_rate_rejected() {
        let err = Config::from_json(r#"{"timer_hz": 0}"#).unwrap_err();
        assert_eq!(err, ConfigError::ZeroRate("timer_hz"));
        assert_eq!(err.to_string(), "timer_hz must be greater than zero");
    }

    #[test]
    fn test_bad_json_rejected() {
        assert!(matches!(Config::from_json("{"), Err(ConfigError::Parse(_))));
    }
}
