//! # Simulation Configuration
//!
//! Runtime parameters for a simulation run. Every field has a default and an
//! environment override.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `QN_TICK_MS` | `tick_interval` | 10 ms |
//! | `QN_INBOX_CAPACITY` | `inbox_capacity` | 4096 |
//! | `QN_EVENT_CAPACITY` | `event_bus_capacity` | 8192 |
//! | `QN_SEED` | `seed` | unset (entropy) |
//! | `QN_AUTO_RETRY_QKD` | `auto_retry_qkd` | `false` |
//! | `QN_MAX_QKD_RETRIES` | `max_qkd_retries` | 3 |

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Period at which each worker drains its inbox.
    pub tick_interval: Duration,
    /// Bounded hand-off queue per node.
    pub inbox_capacity: usize,
    /// Broadcast capacity of the event bus.
    pub event_bus_capacity: usize,
    /// Master seed. Each node derives its own generator from it.
    pub seed: Option<u64>,
    /// Restart a rejected BB84 round from the initiator.
    pub auto_retry_qkd: bool,
    /// Upper bound on automatic restarts per host.
    pub max_qkd_retries: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
            inbox_capacity: 4096,
            event_bus_capacity: 8192,
            seed: None,
            auto_retry_qkd: false,
            max_qkd_retries: 3,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("tick interval must be non-zero")]
    ZeroTick,

    #[error("{0} must be non-zero")]
    ZeroCapacity(&'static str),

    /// A whole BB84 round is enqueued in one go, so it must fit an inbox.
    #[error("channel {channel} sends {num_bits} qubits per round but inboxes hold {capacity}")]
    InboxTooSmall {
        channel: String,
        num_bits: usize,
        capacity: usize,
    },
}

impl SimulationConfig {
    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from `lookup`. Unparseable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse::<u64, _>(&lookup, "QN_TICK_MS") {
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(capacity) = parse(&lookup, "QN_INBOX_CAPACITY") {
            config.inbox_capacity = capacity;
        }
        if let Some(capacity) = parse(&lookup, "QN_EVENT_CAPACITY") {
            config.event_bus_capacity = capacity;
        }
        if let Some(seed) = parse(&lookup, "QN_SEED") {
            info!(seed, "Loaded simulation seed from environment");
            config.seed = Some(seed);
        }
        if let Some(flag) = parse(&lookup, "QN_AUTO_RETRY_QKD") {
            config.auto_retry_qkd = flag;
        }
        if let Some(retries) = parse(&lookup, "QN_MAX_QKD_RETRIES") {
            config.max_qkd_retries = retries;
        }

        config
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ZeroTick);
        }
        if self.inbox_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("inbox_capacity"));
        }
        if self.event_bus_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("event_bus_capacity"));
        }
        Ok(())
    }

    /// Reject a channel whose round would overflow the receiver's inbox.
    pub fn check_round(&self, channel: &str, num_bits: usize) -> Result<(), ConfigError> {
        if num_bits > self.inbox_capacity {
            return Err(ConfigError::InboxTooSmall {
                channel: channel.to_string(),
                num_bits,
                capacity: self.inbox_capacity,
            });
        }
        Ok(())
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable configuration value");
            None
        }
    }
}
