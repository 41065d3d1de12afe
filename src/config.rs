//! Machine configuration.
//!
//! Everything the historical machine left to installation options or
//! console switches, plus the emulator's policy for undefined instruction
//! codes. Stored as JSON:
//!
//! ```json
//! {
//!   "bank_count": 8,
//!   "interrupt_priority": [8, 16, 24, 32],
//!   "illegal_instruction": "fault",
//!   "jump_switches": 0,
//!   "stop_switches": 0
//! }
//! ```

use crate::storage::memory::MAX_BANKS;
use crate::storage::InterruptLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// What the run loop does with an instruction code it cannot execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalInstructionPolicy {
    /// Return `CpuError::IllegalInstruction` and leave the machine untouched.
    #[default]
    Fault,
    /// Stop as ERR does: set the error status and clear run/stop.
    ErrorStop,
    /// Treat it as a one-word no-op.
    NoOperation,
}

/// Configuration of one emulated machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    /// Installed memory banks, 1 to 8.
    pub bank_count: usize,
    /// Interrupt levels, highest priority first. Must name each level once.
    pub interrupt_priority: Vec<InterruptLevel>,
    /// Handling of undefined and peripheral instruction codes.
    pub illegal_instruction: IllegalInstructionPolicy,
    /// Initial jump switch settings, bit 0 is switch 1.
    pub jump_switches: u8,
    /// Initial stop switch settings, bit 0 is switch 1.
    pub stop_switches: u8,
}

impl MachineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MachineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bank_count == 0 || self.bank_count > MAX_BANKS {
            return Err(ConfigError::BankCount(self.bank_count));
        }
        let mut seen = self.interrupt_priority.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != self.interrupt_priority.len() || seen != InterruptLevel::ALL {
            return Err(ConfigError::Priority(self.interrupt_priority.clone()));
        }
        if self.jump_switches > 0o7 || self.stop_switches > 0o7 {
            return Err(ConfigError::Switches {
                jump: self.jump_switches,
                stop: self.stop_switches,
            });
        }
        Ok(())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            bank_count: MAX_BANKS,
            interrupt_priority: InterruptLevel::ALL.to_vec(),
            illegal_instruction: IllegalInstructionPolicy::Fault,
            jump_switches: 0,
            stop_switches: 0,
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("bank count {0} outside 1..=8")]
    BankCount(usize),

    #[error("interrupt priority {0:?} must list levels 10, 20, 30 and 40 exactly once")]
    Priority(Vec<InterruptLevel>),

    #[error("switch masks must fit in three bits (jump {jump:o}, stop {stop:o})")]
    Switches { jump: u8, stop: u8 },
}
