//! # CLI Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     OPME_UTC_OFFSET_MINUTES=-180                                       │
//! │     OPME_LOG_LEVEL=debug                                               │
//! │     OPME_OUTPUT=text                                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/opme-check/opme-check.toml (Linux)                       │
//! │     ~/Library/Application Support/br.opme.opme-check/opme-check.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Brasília time, info logging, JSON output                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `RUST_LOG`, when set, still wins over `[log] level` (see `main.rs`).
//!
//! ## Configuration File Format
//! ```toml
//! # opme-check.toml
//! [clock]
//! utc_offset_minutes = -180  # defines "today" for birth/surgery dates
//!
//! [log]
//! level = "info"
//!
//! [output]
//! format = "json"  # json | text
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use opme_core::clock::{SystemClock, BRASILIA_UTC_OFFSET_MINUTES};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "opme-check.toml";

/// Largest UTC offset, either way, of any inhabited time zone.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Config Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// Output Format
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One JSON document per run.
    #[default]
    Json,

    /// Human-readable lines.
    Text,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            other => Err(ConfigError::Invalid(format!(
                "Unknown output format: '{}'. Valid options: json, text",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockSettings {
    /// Offset from UTC, in minutes, used to decide what "today" is.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
}

fn default_utc_offset() -> i32 {
    BRASILIA_UTC_OFFSET_MINUTES
}

impl Default for ClockSettings {
    fn default() -> Self {
        ClockSettings {
            utc_offset_minutes: default_utc_offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// `trace`, `debug`, `info`, `warn`, `error` or `off`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpmeCheckConfig {
    #[serde(default)]
    pub clock: ClockSettings,

    #[serde(default)]
    pub log: LogSettings,

    #[serde(default)]
    pub output: OutputSettings,

    /// File the config was read from; `None` means defaults and environment.
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

impl OpmeCheckConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`opme-check.toml`), if it exists
    /// 3. Environment variables
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .map(Path::to_path_buf)
            .or_else(Self::default_config_path);
        if let Some(path) = path {
            // an explicit path must exist; the default one is optional
            if config_path.is_some() || path.exists() {
                let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                config = Self::from_toml(&contents)?;
                config.loaded_from = Some(path);
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let offset = self.clock.utc_offset_minutes;
        if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&offset) {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes must be between -{max} and {max}, got {offset}",
                max = MAX_UTC_OFFSET_MINUTES
            )));
        }

        if self.log.level.parse::<LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "Unknown log level: '{}'",
                self.log.level
            )));
        }

        Ok(())
    }

    /// Applies `OPME_*` overrides read through `lookup`.
    ///
    /// `main` passes the process environment; tests pass a map.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(offset) = lookup("OPME_UTC_OFFSET_MINUTES") {
            self.clock.utc_offset_minutes = offset.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "OPME_UTC_OFFSET_MINUTES must be an integer, got '{}'",
                    offset
                ))
            })?;
        }

        if let Some(level) = lookup("OPME_LOG_LEVEL") {
            self.log.level = level;
        }

        if let Some(format) = lookup("OPME_OUTPUT") {
            self.output.format = format.parse()?;
        }

        Ok(())
    }

    /// The clock every date rule reads "today" from.
    pub fn clock(&self) -> Result<SystemClock, ConfigError> {
        SystemClock::from_offset_minutes(self.clock.utc_offset_minutes).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "utc_offset_minutes {} is out of range",
                self.clock.utc_offset_minutes
            ))
        })
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("br", "opme", "opme-check")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = OpmeCheckConfig::default();
        assert_eq!(config.clock.utc_offset_minutes, -180);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_partial_sections() {
        let config = OpmeCheckConfig::from_toml(
            r#"
            [output]
            format = "text"
            "#,
        )
        .unwrap();
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.clock.utc_offset_minutes, -180);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_toml_full() {
        let config = OpmeCheckConfig::from_toml(
            r#"
            [clock]
            utc_offset_minutes = -240

            [log]
            level = "debug"

            [output]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.clock.utc_offset_minutes, -240);
        assert_eq!(config.log.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_rejects_unknown_format() {
        let err = OpmeCheckConfig::from_toml("[output]\nformat = \"xml\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = OpmeCheckConfig::default();
        config
            .apply_env_overrides(env(&[
                ("OPME_UTC_OFFSET_MINUTES", "0"),
                ("OPME_LOG_LEVEL", "warn"),
                ("OPME_OUTPUT", "TEXT"),
            ]))
            .unwrap();
        assert_eq!(config.clock.utc_offset_minutes, 0);
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_env_overrides_reject_garbage() {
        let mut config = OpmeCheckConfig::default();
        assert!(config
            .apply_env_overrides(env(&[("OPME_UTC_OFFSET_MINUTES", "brt")]))
            .is_err());
        assert!(config
            .apply_env_overrides(env(&[("OPME_OUTPUT", "yaml")]))
            .is_err());
        // nothing set, nothing changed
        config.apply_env_overrides(env(&[])).unwrap();
        assert_eq!(config.clock.utc_offset_minutes, -180);
    }

    #[test]
    fn test_validation() {
        let mut config = OpmeCheckConfig::default();
        config.clock.utc_offset_minutes = 14 * 60;
        assert!(config.validate().is_ok());
        assert!(config.clock().is_ok());

        config.clock.utc_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());

        config.clock.utc_offset_minutes = 0;
        config.log.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err =
            OpmeCheckConfig::load(Some(Path::new("/nonexistent/opme-check.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
