//! Configuration loading and validation.
//!
//! Layers a YAML file under environment-variable overrides via `figment`,
//! with `SCHEDULER_`-prefixed env vars taking precedence over the file.

use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::Deserialize;

use crate::error::ConfigError;

/// `development` uses a local kube-config file; `production` uses
/// in-cluster credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawConfig {
    #[serde(default = "default_environment")]
    environment: Environment,
    #[serde(default)]
    included_pool: String,
    #[serde(default)]
    excluded_pool: String,
    graceful_period: u32,
    #[serde(default)]
    peak_hour_ranges: Vec<String>,
    #[serde(default)]
    debug: bool,
}

fn default_environment() -> Environment {
    Environment::Production
}

/// Validated, in-memory configuration. Distinct from [`RawConfig`] so a
/// malformed-but-parseable document (e.g. both pool filters set) is still
/// caught before anything downstream sees it.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub included_pool: Option<String>,
    pub excluded_pool: Option<String>,
    pub graceful_period_minutes: u32,
    pub peak_hour_ranges: Vec<String>,
    pub debug: bool,
}

impl Config {
    /// Derived lead time ("start of peak") so drains complete before peak
    /// begins: `2 * graceful_period`.
    pub fn near_peak_window(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.graceful_period_minutes) * 60 * 2)
    }

    /// The drain deadline: `graceful_period` expressed as a duration.
    pub fn graceful_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.graceful_period_minutes) * 60)
    }

    /// Load and validate configuration from `path`, with `SCHEDULER_`-
    /// prefixed environment variables layered on top.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let raw: RawConfig = Figment::new()
            .merge(Yaml::string(&contents))
            .merge(Env::prefixed("SCHEDULER_"))
            .extract()?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        if raw.graceful_period == 0 {
            return Err(ConfigError::Validation(
                "graceful-period must be greater than zero".to_string(),
            ));
        }

        if !raw.included_pool.is_empty() && !raw.excluded_pool.is_empty() {
            return Err(ConfigError::Validation(
                "included-pool and excluded-pool are mutually exclusive".to_string(),
            ));
        }

        Ok(Config {
            environment: raw.environment,
            included_pool: non_empty(raw.included_pool),
            excluded_pool: non_empty(raw.excluded_pool),
            graceful_period_minutes: raw.graceful_period,
            peak_hour_ranges: raw.peak_hour_ranges,
            debug: raw.debug,
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(graceful_period: u32, included: &str, excluded: &str) -> RawConfig {
        RawConfig {
            environment: Environment::Production,
            included_pool: included.to_string(),
            excluded_pool: excluded.to_string(),
            graceful_period,
            peak_hour_ranges: vec!["11:00-15:00".to_string()],
            debug: false,
        }
    }

    #[test]
    fn zero_graceful_period_is_invalid() {
        assert!(Config::from_raw(raw(0, "", "")).is_err());
    }

    #[test]
    fn both_pool_filters_set_is_invalid() {
        assert!(Config::from_raw(raw(15, "a", "b")).is_err());
    }

    #[test]
    fn near_peak_window_is_double_graceful_period() {
        let cfg = Config::from_raw(raw(15, "", "")).unwrap();
        assert_eq!(cfg.near_peak_window(), std::time::Duration::from_secs(30 * 60));
        assert_eq!(cfg.graceful_period(), std::time::Duration::from_secs(15 * 60));
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let path = Path::new("/nonexistent/path/to/config.yaml");
        match Config::load(path) {
            Err(ConfigError::Io { path: reported, .. }) => {
                assert_eq!(reported, path.display().to_string());
            }
            other => panic!("expected ConfigError::Io, got {other:?}"),
        }
    }
}
