//! Engine Configuration
//!
//! Defaults mirror the live platform: one tick per second, the 50 most recent
//! bets per session and a day of one-second price history. Every field can be
//! overridden from a `BITMARKET_*` environment variable.

use std::time::Duration;

use crate::casino::bet::DEFAULT_HISTORY_CAPACITY;
use crate::fairness::seed::DEFAULT_CLIENT_SEED;
use crate::market::probability::DEFAULT_HACK_DURATION_SECS;
use crate::market::tick::DEFAULT_PRICE_HISTORY;

/// Environment variable names.
pub mod env {
    /// Tick interval in milliseconds.
    pub const TICK_INTERVAL_MS: &str = "BITMARKET_TICK_INTERVAL_MS";
    /// Bets kept per session.
    pub const BET_HISTORY: &str = "BITMARKET_BET_HISTORY";
    /// Price points kept per asset.
    pub const PRICE_HISTORY: &str = "BITMARKET_PRICE_HISTORY";
    /// Client seed given to new sessions.
    pub const CLIENT_SEED: &str = "BITMARKET_CLIENT_SEED";
    /// Hack override lifetime in seconds.
    pub const HACK_DURATION_SECS: &str = "BITMARKET_HACK_DURATION_SECS";
    /// Market RNG seed; unset means OS entropy.
    pub const MARKET_SEED: &str = "BITMARKET_MARKET_SEED";
    /// Enables the next-roll peek.
    pub const DIAGNOSTICS: &str = "BITMARKET_DIAGNOSTICS";
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Interval between market ticks.
    pub tick_interval: Duration,
    /// Bets kept per session.
    pub bet_history_capacity: usize,
    /// Price points kept per asset.
    pub price_history_capacity: usize,
    /// Client seed for sessions that do not supply one.
    pub default_client_seed: String,
    /// Lifetime of a hack override.
    pub hack_duration: Duration,
    /// Market RNG seed. `None` draws one from OS entropy.
    pub market_seed: Option<u64>,
    /// Allow `peek_next_roll`. Exposes unrevealed server seeds; keep off in
    /// production.
    pub diagnostics_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1000 / u64::from(crate::TICK_RATE_HZ)),
            bet_history_capacity: DEFAULT_HISTORY_CAPACITY,
            price_history_capacity: DEFAULT_PRICE_HISTORY,
            default_client_seed: DEFAULT_CLIENT_SEED.to_string(),
            hack_duration: Duration::from_secs(DEFAULT_HACK_DURATION_SECS),
            market_seed: None,
            diagnostics_enabled: false,
        }
    }
}

/// Bad configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Variable is set but does not parse.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// Value parses but is unusable.
    #[error("{name} must be greater than zero")]
    Zero {
        /// Variable name.
        name: &'static str,
    },
}

impl EngineConfig {
    /// Load from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let tick_interval = match parse_positive::<u64, _>(&lookup, env::TICK_INTERVAL_MS)? {
            Some(ms) => Duration::from_millis(ms),
            None => defaults.tick_interval,
        };
        let hack_duration = match parse_positive::<u64, _>(&lookup, env::HACK_DURATION_SECS)? {
            Some(secs) => Duration::from_secs(secs),
            None => defaults.hack_duration,
        };

        Ok(Self {
            tick_interval,
            bet_history_capacity: parse_positive(&lookup, env::BET_HISTORY)?
                .unwrap_or(defaults.bet_history_capacity),
            price_history_capacity: parse_positive(&lookup, env::PRICE_HISTORY)?
                .unwrap_or(defaults.price_history_capacity),
            default_client_seed: lookup(env::CLIENT_SEED)
                .filter(|seed| !seed.is_empty())
                .unwrap_or(defaults.default_client_seed),
            hack_duration,
            market_seed: parse::<u64, _>(&lookup, env::MARKET_SEED)?,
            diagnostics_enabled: lookup(env::DIAGNOSTICS)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.diagnostics_enabled),
        })
    }
}

fn parse<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

fn parse_positive<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
    F: Fn(&str) -> Option<String>,
{
    match parse::<T, F>(lookup, name)? {
        Some(value) if value == T::default() => Err(ConfigError::Zero { name }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.bet_history_capacity, 50);
        assert_eq!(config.price_history_capacity, 8640);
        assert_eq!(config.hack_duration, Duration::from_secs(60));
        assert!(!config.diagnostics_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            (env::TICK_INTERVAL_MS, "250"),
            (env::BET_HISTORY, "10"),
            (env::CLIENT_SEED, "lucky"),
            (env::MARKET_SEED, "42"),
            (env::DIAGNOSTICS, "1"),
        ]))
        .unwrap();

        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.bet_history_capacity, 10);
        assert_eq!(config.default_client_seed, "lucky");
        assert_eq!(config.market_seed, Some(42));
        assert!(config.diagnostics_enabled);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[(env::BET_HISTORY, "lots")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue { name: env::BET_HISTORY, value: "lots".into() });

        let err = EngineConfig::from_lookup(lookup(&[(env::TICK_INTERVAL_MS, "0")])).unwrap_err();
        assert_eq!(err, ConfigError::Zero { name: env::TICK_INTERVAL_MS });
    }
}
