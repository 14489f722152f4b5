//! Escrow configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Escrow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EscrowConfig {
    /// Grace period before held funds auto-release, in days
    #[serde(default = "default_auto_release_days")]
    pub auto_release_days: u32,

    /// How often the auto-release sweep runs, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl EscrowConfig {
    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate escrow configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.auto_release_days == 0 || self.auto_release_days > 365 {
            return Err(ValidationError::InvalidAutoReleaseDays);
        }
        if self.sweep_interval_secs < 60 {
            return Err(ValidationError::InvalidSweepInterval);
        }
        Ok(())
    }
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            auto_release_days: default_auto_release_days(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_auto_release_days() -> u32 {
    30
}

fn default_sweep_interval() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EscrowConfig::default();
        assert_eq!(config.auto_release_days, 30);
        assert_eq!(config.sweep_interval(), Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_grace_period_is_rejected() {
        let config = EscrowConfig {
            auto_release_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn sub_minute_sweep_interval_is_rejected() {
        let config = EscrowConfig {
            sweep_interval_secs: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
