//! Configuration management utilities

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
    /// `EnvFilter` directive for log output
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "earnings".to_string(),
            environment: "development".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    /// Read `APP_ENV` and `RUST_LOG`, keeping defaults for unset values
    pub fn from_env(app_name: impl Into<String>) -> Self {
        Self::from_lookup(app_name, |key| std::env::var(key).ok())
    }

    fn from_lookup(app_name: impl Into<String>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new(app_name);
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            environment: non_empty("APP_ENV").unwrap_or(defaults.environment),
            log_filter: non_empty("RUST_LOG").unwrap_or(defaults.log_filter),
            app_name: defaults.app_name,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "prod" | "production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::new("earnings-cli");
        assert_eq!(config.app_name, "earnings-cli");
        assert_eq!(config.environment, "development");
        assert_eq!(config.log_filter, "info");
        assert!(!config.is_production());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("APP_ENV", "Production"), ("RUST_LOG", "earnings_core=debug")]);
        let config = Config::from_lookup("earnings-cli", |k| vars.get(k).map(|v| (*v).to_string()));
        assert!(config.is_production());
        assert_eq!(config.log_filter, "earnings_core=debug");
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = Config::from_lookup("x", |_| Some("  ".to_string()));
        assert_eq!(config.environment, "development");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_serde_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
    }
}
