//! Control plane configuration.

use std::time::Duration;

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than 0")]
    Zero(&'static str),
}

/// Control plane configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address.
    pub http_bind_addr: String,

    /// Maximum number of activity log entries retained.
    pub log_capacity: usize,

    /// How far a live subscriber may fall behind before it skips events.
    pub stream_buffer: usize,

    /// Delay of the simulated executor (milliseconds).
    pub simulated_delay_ms: u64,
}

impl Config {
    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_capacity == 0 {
            return Err(ConfigError::Zero("log_capacity"));
        }
        if self.stream_buffer == 0 {
            return Err(ConfigError::Zero("stream_buffer"));
        }
        Ok(())
    }

    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_bind_addr: "[::1]:8080".to_string(),
            log_capacity: 1000,
            stream_buffer: 256,
            simulated_delay_ms: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = Config {
            log_capacity: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("log_capacity")));
    }
}
