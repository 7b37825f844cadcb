//! Configuration for the dimension engine.

use serde::{Deserialize, Serialize};

/// Engine-wide settings shared by every dimension of every layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionsConfig {
    /// Upper bound on histogram buckets per request.
    pub max_histogram_buckets: usize,

    /// Separator between min and max in interval presentations.
    pub interval_separator: String,
}

impl Default for DimensionsConfig {
    fn default() -> Self {
        Self {
            max_histogram_buckets: 10_000,
            interval_separator: "--".to_string(),
        }
    }
}

impl DimensionsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DIMENSIONS_MAX_HISTOGRAM_BUCKETS") {
            if let Ok(max) = val.parse() {
                config.max_histogram_buckets = max;
            }
        }

        if let Ok(val) = std::env::var("DIMENSIONS_INTERVAL_SEPARATOR") {
            config.interval_separator = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_histogram_buckets == 0 {
            return Err("max_histogram_buckets must be > 0".to_string());
        }

        if self.interval_separator.is_empty() {
            return Err("interval_separator must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DimensionsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.interval_separator, "--");
    }

    #[test]
    fn test_validate_rejects_zero_buckets() {
        let config = DimensionsConfig {
            max_histogram_buckets: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: DimensionsConfig =
            serde_json::from_str(r#"{"max_histogram_buckets": 50}"#).unwrap();
        assert_eq!(config.max_histogram_buckets, 50);
        assert_eq!(config.interval_separator, "--");
    }
}
