//! Configuration system
//!
//! Presence tracking is configured through plain serde structs that can be
//! loaded from TOML or RON files. Every field has a default, so an empty
//! file (or no file at all) yields the stock behavior.

pub use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        match Format::of(path)? {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Top-level presence tracking configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Contact set settings
    pub zone: ZoneConfig,
    /// Aggregator diagnostics
    pub diagnostics: DiagnosticsConfig,
}

impl Config for PresenceConfig {}

/// Settings for a single [`ContactSet`](crate::physics::ContactSet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Label used in log output
    pub name: String,
    /// Number of handles pre-allocated for the per-tick buffers
    pub initial_capacity: usize,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            name: "zone".to_string(),
            initial_capacity: 16,
        }
    }
}

/// Controls whether silently ignored cases are logged
///
/// Counting in [`PresenceDiagnostics`](crate::physics::PresenceDiagnostics)
/// happens regardless; this only gates the `debug` log lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Log contacts with no resolvable owner and removals for unknown entities
    pub log_unresolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_silent() {
        let config = PresenceConfig::default();
        assert_eq!(config.zone.name, "zone");
        assert_eq!(config.zone.initial_capacity, 16);
        assert!(!config.diagnostics.log_unresolved);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: PresenceConfig = toml::from_str(
            r#"
            [zone]
            name = "hoop"

            [diagnostics]
            log_unresolved = true
            "#,
        )
        .unwrap();

        assert_eq!(config.zone.name, "hoop");
        assert_eq!(config.zone.initial_capacity, 16);
        assert!(config.diagnostics.log_unresolved);
    }

    #[test]
    fn test_ron_parse() {
        let config: PresenceConfig =
            ron::from_str("(zone: (name: \"gate\", initial_capacity: 4))").unwrap();

        assert_eq!(config.zone.name, "gate");
        assert_eq!(config.zone.initial_capacity, 4);
        assert_eq!(config.diagnostics, DiagnosticsConfig::default());
    }

    #[test]
    fn test_save_and_load_toml_file() {
        let path = std::env::temp_dir().join(format!("presence_config_{}.toml", std::process::id()));
        let mut config = PresenceConfig::default();
        config.zone.name = "punch-target".to_string();

        config.save_to_file(&path).unwrap();
        let loaded = PresenceConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = PresenceConfig::default().save_to_file("presence.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = PresenceConfig::load_from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
