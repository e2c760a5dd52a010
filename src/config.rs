//! Runtime configuration read from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Latency between a clean submit and the store call when nothing is configured.
pub const DEFAULT_SUBMIT_DELAY: Duration = Duration::from_millis(800);

const MIN_SUBMIT_DELAY_MS: u64 = 1;
const MAX_SUBMIT_DELAY_MS: u64 = 10_000;

pub const MIN_SUBMIT_DELAY: Duration = Duration::from_millis(MIN_SUBMIT_DELAY_MS);
pub const MAX_SUBMIT_DELAY: Duration = Duration::from_millis(MAX_SUBMIT_DELAY_MS);

pub const SUBMIT_DELAY_VAR: &str = "CHECKOUT_SUBMIT_DELAY_MS";
pub const CATALOG_VAR: &str = "CHECKOUT_CATALOG";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: '{value}' is not a whole number of milliseconds")]
    NotANumber { key: &'static str, value: String },

    #[error("{key}: {value}ms is outside 1..=10000")]
    OutOfRange { key: &'static str, value: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub submit_delay: Duration,
    /// Variant catalog CSV; the built-in catalog is used when unset.
    pub catalog: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            submit_delay: DEFAULT_SUBMIT_DELAY,
            catalog: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(raw) = get(SUBMIT_DELAY_VAR) {
            let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::NotANumber {
                key: SUBMIT_DELAY_VAR,
                value: raw.clone(),
            })?;
            if !(MIN_SUBMIT_DELAY_MS..=MAX_SUBMIT_DELAY_MS).contains(&ms) {
                return Err(ConfigError::OutOfRange {
                    key: SUBMIT_DELAY_VAR,
                    value: ms,
                });
            }
            config.submit_delay = Duration::from_millis(ms);
        }

        config.catalog = get(CATALOG_VAR).map(PathBuf::from);
        Ok(config)
    }
}
