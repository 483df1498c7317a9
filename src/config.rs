//! Runtime configuration and the constants behind its defaults.

use tracing::warn;

/// Default bound of each actor's mailbox.
pub const DEFAULT_CHANNEL_BUFFER: usize = 100;

/// Default log filter when neither `RUST_LOG` nor `MARKET_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default upper bound on a purchase request message, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1000;

pub const CHANNEL_BUFFER_ENV: &str = "MARKET_CHANNEL_BUFFER";
pub const LOG_FILTER_ENV: &str = "MARKET_LOG";
pub const MAX_MESSAGE_LEN_ENV: &str = "MARKET_MAX_MESSAGE_LEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketConfig {
    pub channel_buffer: usize,
    pub log_filter: String,
    pub max_message_len: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl MarketConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Invalid values keep the default and log a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            channel_buffer: positive(&lookup, CHANNEL_BUFFER_ENV).unwrap_or(defaults.channel_buffer),
            log_filter: lookup(LOG_FILTER_ENV)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_filter),
            max_message_len: positive(&lookup, MAX_MESSAGE_LEN_ENV).unwrap_or(defaults.max_message_len),
        }
    }
}

fn positive(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!(key, value = %raw, "Ignoring invalid configuration value");
            None
        }
    }
}
