//! Machine configuration.
//!
//! The defaults describe the standard machine: four registers and a stack
//! that starts at the top of data memory. A configuration can be read from
//! a JSON file; missing fields take their default.

use crate::cpu::registers::{DEFAULT_REGISTER_COUNT, MAX_REGISTER_COUNT, MIN_REGISTER_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const DEFAULT_STACK_TOP: u8 = 0xFF;

/// Power-on parameters of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    /// Number of general purpose registers.
    pub register_count: usize,
    /// Initial stack pointer; the stack grows down from here.
    pub stack_top: u8,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            register_count: DEFAULT_REGISTER_COUNT,
            stack_top: DEFAULT_STACK_TOP,
        }
    }
}

impl MachineConfig {
    /// Check the configuration describes a machine that can run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_REGISTER_COUNT..=MAX_REGISTER_COUNT).contains(&self.register_count) {
            return Err(ConfigError::Invalid(format!(
                "register_count must be between {} and {}, got {}",
                MIN_REGISTER_COUNT, MAX_REGISTER_COUNT, self.register_count
            )));
        }
        if self.stack_top == 0 {
            return Err(ConfigError::Invalid("stack_top must be non-zero".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }
}

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = MachineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.register_count, 4);
        assert_eq!(config.stack_top, 0xFF);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MachineConfig::from_json_str(r#"{ "register_count": 8 }"#).unwrap();
        assert_eq!(config.register_count, 8);
        assert_eq!(config.stack_top, 0xFF);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            MachineConfig::from_json_str(r#"{ "register_count": 1 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            MachineConfig::from_json_str(r#"{ "stack_top": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            MachineConfig::from_json_str(r#"{ "registers": 4 }"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
