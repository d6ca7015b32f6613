//! Configuration for the costing CLI

use core_config::{ConfigError, FromEnv, env_flag, env_or_default};
use std::path::PathBuf;

const DEFAULT_SNAPSHOT: &str = "catalog.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Catalog snapshot to read (`COSTING_SNAPSHOT`)
    pub snapshot_path: PathBuf,
    /// Print Prometheus metrics to stderr after the command (`COSTING_METRICS`)
    pub emit_metrics: bool,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            snapshot_path: PathBuf::from(env_or_default("COSTING_SNAPSHOT", DEFAULT_SNAPSHOT)),
            emit_metrics: env_flag("COSTING_METRICS", false)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(["COSTING_SNAPSHOT", "COSTING_METRICS"], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.snapshot_path, PathBuf::from(DEFAULT_SNAPSHOT));
            assert!(!config.emit_metrics);
        });
    }

    #[test]
    fn test_reads_environment() {
        temp_env::with_vars(
            [
                ("COSTING_SNAPSHOT", Some("/data/kitchen.json")),
                ("COSTING_METRICS", Some("true")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.snapshot_path, PathBuf::from("/data/kitchen.json"));
                assert!(config.emit_metrics);
            },
        );
    }

    #[test]
    fn test_invalid_metrics_flag() {
        temp_env::with_var("COSTING_METRICS", Some("sometimes"), || {
            assert!(Config::from_env().is_err());
        });
    }
}
