//! Connection parameters handed to the supervisor.

use crate::session::Endpoint;
use std::time::Duration;

/// Everything one supervisor needs. Loading it from flags, environment or
/// files is the caller's business.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub read_port: u16,
    pub write_port: u16,
    pub token: String,
    pub timeouts: Timeouts,
}

/// Timers governing liveness and recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// A single read on the read stream longer than this is a dead connection.
    pub read: Duration,
    /// Longest tolerated gap between liveness signals.
    pub watchdog: Duration,
    /// Period of the keep-alive pulse. Must be shorter than `watchdog`.
    pub keep_alive: Duration,
    /// Fixed pause between a failed epoch and the next attempt.
    pub backoff: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(5),
            watchdog: Duration::from_secs(20),
            keep_alive: Duration::from_secs(2),
            backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("watchdog window {watchdog:?} must exceed the keep-alive period {keep_alive:?}")]
    WatchdogTooShort {
        watchdog: Duration,
        keep_alive: Duration,
    },
    #[error("{0} must be non-zero")]
    ZeroDuration(&'static str),
    #[error("no token configured; register first or pass one explicitly")]
    MissingToken,
}

impl ClientConfig {
    pub fn read_endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.read_port)
    }

    pub fn write_endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.write_port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        self.timeouts.validate()
    }
}

impl Timeouts {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("read timeout", self.read),
            ("watchdog window", self.watchdog),
            ("keep-alive period", self.keep_alive),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        if self.watchdog <= self.keep_alive {
            return Err(ConfigError::WatchdogTooShort {
                watchdog: self.watchdog,
                keep_alive: self.keep_alive,
            });
        }
        Ok(())
    }
}
