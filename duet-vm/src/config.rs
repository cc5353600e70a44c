//! # VM Configuration

use crate::error::{self, Result};
use serde::{Deserialize, Serialize};

/// Default ceiling on executed steps per run
pub const DEFAULT_MAX_STEPS: u64 = 10_000_000;

/// Limits applied to every host run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfig {
    /// Maximum instructions (or scheduler ticks) before giving up
    pub max_steps: u64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl VmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Reject limits that could never let a program run
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(error::config_invalid("max_steps must be at least 1")
                .with_operation("config::validate"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = VmConfig::default();
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_steps_rejected() {
        let err = VmConfig::new().with_max_steps(0).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
