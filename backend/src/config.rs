use std::{net::SocketAddr, str::FromStr, time::Duration};

use crate::error::ConfigError;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// HTTP server settings, read from `TTUTTA_ADDR` and `TTUTTA_SEED`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Seed for route synthesis; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = parse_value(
            "TTUTTA_ADDR",
            lookup("TTUTTA_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
        )?;
        let seed = parse_optional::<u64>("TTUTTA_SEED", &lookup)?;
        Ok(Self { addr, seed })
    }
}

/// Timing and thresholds for a navigation session.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationConfig {
    /// Delay between two position samples.
    pub sample_interval: Duration,
    /// How long one sample may wait for the location source.
    pub fix_timeout: Duration,
    /// Older fixes are rejected as stale.
    pub max_fix_age: Duration,
    pub arrival_threshold_km: f64,
    /// Speed assumed for the ETA when the fix carries none.
    pub fallback_speed_kmh: f64,
    /// How many waypoints ahead the next instruction looks.
    pub lookahead_points: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(1),
            fix_timeout: Duration::from_secs(8),
            max_fix_age: Duration::from_secs(10),
            arrival_threshold_km: 0.05,
            fallback_speed_kmh: 15.0,
            lookahead_points: 5,
        }
    }
}

impl NavigationConfig {
    /// Defaults overridden by `NAV_SAMPLE_INTERVAL_MS`, `NAV_FIX_TIMEOUT_MS` and `NAV_MAX_FIX_AGE_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(ms) = parse_optional::<u64>("NAV_SAMPLE_INTERVAL_MS", &lookup)? {
            config.sample_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = parse_optional::<u64>("NAV_FIX_TIMEOUT_MS", &lookup)? {
            config.fix_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_optional::<u64>("NAV_MAX_FIX_AGE_MS", &lookup)? {
            config.max_fix_age = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_optional<T: FromStr>(
    key: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<T>, ConfigError> {
    lookup(key).map(|value| parse_value(key, value)).transpose()
}

fn parse_value<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_follow_sampling_policy() {
        let config = NavigationConfig::default();
        assert_eq!(config.sample_interval, Duration::from_secs(1));
        assert!(config.fix_timeout >= Duration::from_secs(8));
        assert!(config.max_fix_age <= Duration::from_secs(10));
        assert_eq!(config.lookahead_points, 5);
    }

    #[test]
    fn parse_value_reports_key() {
        let err = parse_value::<u64>("TTUTTA_SEED", "abc".into()).unwrap_err();
        assert_eq!(err.to_string(), "invalid value \"abc\" for TTUTTA_SEED");
        let addr: SocketAddr = parse_value("TTUTTA_ADDR", DEFAULT_ADDR.into()).unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn navigation_overrides_come_from_lookup() {
        let config = NavigationConfig::from_lookup(lookup_in(&[
            ("NAV_SAMPLE_INTERVAL_MS", "250"),
            ("NAV_FIX_TIMEOUT_MS", " 12000 "),
            ("NAV_MAX_FIX_AGE_MS", "2000"),
        ]))
        .unwrap();
        assert_eq!(config.sample_interval, Duration::from_millis(250));
        assert_eq!(config.fix_timeout, Duration::from_secs(12));
        assert_eq!(config.max_fix_age, Duration::from_secs(2));
        assert_eq!(config.lookahead_points, 5);
    }

    #[test]
    fn navigation_defaults_without_overrides() {
        let config = NavigationConfig::from_lookup(lookup_in(&[])).unwrap();
        assert_eq!(config, NavigationConfig::default());
    }

    #[test]
    fn zero_sample_interval_is_raised_to_one_ms() {
        let config =
            NavigationConfig::from_lookup(lookup_in(&[("NAV_SAMPLE_INTERVAL_MS", "0")])).unwrap();
        assert_eq!(config.sample_interval, Duration::from_millis(1));
    }

    #[test]
    fn bad_navigation_value_names_its_key() {
        let err = NavigationConfig::from_lookup(lookup_in(&[("NAV_FIX_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid value \"soon\" for NAV_FIX_TIMEOUT_MS");
    }

    #[test]
    fn server_config_from_lookup() {
        let config = ServerConfig::from_lookup(lookup_in(&[
            ("TTUTTA_ADDR", "127.0.0.1:9000"),
            ("TTUTTA_SEED", "42"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.seed, Some(42));

        let defaults = ServerConfig::from_lookup(lookup_in(&[])).unwrap();
        assert_eq!(defaults.addr.port(), 8080);
        assert_eq!(defaults.seed, None);
    }
}
