//! Configuration for the layout engine

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a layout configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Configuration options for layout computation
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Gap between the extents of consecutive nodes in a row
    pub node_spacing: f64,

    /// Size (width, height) of persons without an explicit size
    pub default_node_size: (f64, f64),

    /// Time budget for the row assignment solver
    pub row_timeout: Duration,

    /// Time budget for the coordinate assignment solver
    pub coordinate_timeout: Duration,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 20.0,
            default_node_size: (120.0, 40.0),
            row_timeout: Duration::from_secs(30),
            coordinate_timeout: Duration::from_secs(30),
        }
    }
}

/// TOML structure for deserializing configurations
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlLayoutConfig {
    node_spacing: Option<f64>,
    default_node_size: Option<(f64, f64)>,
    row_timeout_secs: Option<f64>,
    coordinate_timeout_secs: Option<f64>,
}

fn node_size(key: &'static str, (width, height): (f64, f64)) -> Result<(f64, f64), ConfigError> {
    if !(width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0) {
        return Err(ConfigError::InvalidValue {
            key,
            reason: format!("expected a non-negative size, got [{}, {}]", width, height),
        });
    }
    Ok((width, height))
}

fn seconds(key: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|e| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
    })
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load a configuration from a TOML string; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlLayoutConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(spacing) = parsed.node_spacing {
            if !spacing.is_finite() || spacing < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: "node_spacing",
                    reason: format!("expected a non-negative number, got {}", spacing),
                });
            }
            config.node_spacing = spacing;
        }
        if let Some(size) = parsed.default_node_size {
            config.default_node_size = node_size("default_node_size", size)?;
        }
        if let Some(secs) = parsed.row_timeout_secs {
            config.row_timeout = seconds("row_timeout_secs", secs)?;
        }
        if let Some(secs) = parsed.coordinate_timeout_secs {
            config.coordinate_timeout = seconds("coordinate_timeout_secs", secs)?;
        }
        Ok(config)
    }

    /// Set the spacing between nodes
    pub fn with_node_spacing(mut self, spacing: f64) -> Self {
        self.node_spacing = spacing;
        self
    }

    /// Set the default node size
    pub fn with_node_size(mut self, width: f64, height: f64) -> Self {
        self.default_node_size = (width, height);
        self
    }

    /// Set the row assignment time budget
    pub fn with_row_timeout(mut self, timeout: Duration) -> Self {
        self.row_timeout = timeout;
        self
    }

    /// Set the coordinate assignment time budget
    pub fn with_coordinate_timeout(mut self, timeout: Duration) -> Self {
        self.coordinate_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayoutConfig::default();
        assert_eq!(config.node_spacing, 20.0);
        assert_eq!(config.default_node_size, (120.0, 40.0));
        assert_eq!(config.row_timeout, Duration::from_secs(30));
        assert_eq!(config.coordinate_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_pattern() {
        let config = LayoutConfig::new()
            .with_node_size(150.0, 75.0)
            .with_node_spacing(30.0)
            .with_row_timeout(Duration::from_millis(500));

        assert_eq!(config.default_node_size, (150.0, 75.0));
        assert_eq!(config.node_spacing, 30.0);
        assert_eq!(config.row_timeout, Duration::from_millis(500));
        assert_eq!(config.coordinate_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = LayoutConfig::from_toml_str(
            r#"
node_spacing = 8.5
coordinate_timeout_secs = 1.5
"#,
        )
        .unwrap();
        assert_eq!(config.node_spacing, 8.5);
        assert_eq!(config.coordinate_timeout, Duration::from_millis(1500));
        assert_eq!(config.default_node_size, (120.0, 40.0));
    }

    #[test]
    fn test_from_toml_empty_is_default() {
        assert_eq!(LayoutConfig::from_toml_str("").unwrap(), LayoutConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_negative_timeout() {
        let err = LayoutConfig::from_toml_str("row_timeout_secs = -1.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "row_timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_from_toml_rejects_negative_size() {
        let err = LayoutConfig::from_toml_str("default_node_size = [-5.0, 40.0]").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "default_node_size",
                ..
            }
        ));
        assert!(LayoutConfig::from_toml_str("default_node_size = [0.0, 40.0]").is_ok());
    }

    #[test]
    fn test_from_toml_rejects_unknown_key() {
        let err = LayoutConfig::from_toml_str("spacing = 3.0").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
