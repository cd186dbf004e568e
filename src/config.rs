/// Service configuration loaded from TOML.
///
/// Every section and field has a default, so an empty file (or a file that
/// only overrides one value) is a valid configuration. See `dsd.toml` at the
/// repository root for the full layout.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::events::EventConfig;
use crate::logging::{self, LogLevel, Stage};
use crate::spectrum::DEFAULT_DELTA_T_SECS;

/// Configuration file read when `DSD_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "./dsd.toml";

// ---------------------------------------------------------------------------
// Configuration sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DsdConfig {
    pub spectrum: SpectrumConfig,
    pub events: EventConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// Instrument integration interval in seconds.
    pub delta_t_secs: f64,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            delta_t_secs: DEFAULT_DELTA_T_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of "debug", "info", "warn", "error".
    pub level: String,
    /// Append log entries to this file in addition to the console.
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console_timestamps: true,
        }
    }
}

impl LoggingConfig {
    pub fn min_level(&self) -> Result<LogLevel, ConfigError> {
        self.level.parse().map_err(ConfigError::Invalid)
    }

    /// Installs the global logger described by this section.
    pub fn init(&self) -> Result<(), ConfigError> {
        logging::init_logger(self.min_level()?, self.file.as_deref(), self.console_timestamps);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The file could not be read.
    Io(String),
    /// The file is not valid TOML or has fields of the wrong type.
    Parse(String),
    /// The file parsed but a value is out of range.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config read error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Reads and validates a configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DsdConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    let config = parse_config(&text)?;
    logging::debug(
        Stage::Config,
        None,
        &format!("Loaded configuration from {}", path.display()),
    );
    Ok(config)
}

/// Loads the configuration named by `DSD_CONFIG`.
///
/// With the variable unset, `./dsd.toml` is used if present and the
/// defaults otherwise. A path given explicitly must load.
pub fn resolve_config(explicit_path: Option<&str>) -> Result<DsdConfig, ConfigError> {
    match explicit_path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH),
        None => Ok(DsdConfig::default()),
    }
}

/// Parses and validates configuration text.
pub fn parse_config(text: &str) -> Result<DsdConfig, ConfigError> {
    let config: DsdConfig = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

impl DsdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let delta_t = self.spectrum.delta_t_secs;
        if !(delta_t.is_finite() && delta_t > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "spectrum.delta_t_secs must be positive, got {}",
                delta_t
            )));
        }
        if self.events.max_break().is_err() {
            return Err(ConfigError::Invalid(format!(
                "events.max_break_minutes must be positive and within range, got {}",
                self.events.max_break_minutes
            )));
        }
        if !self.events.min_total_count.is_finite() {
            return Err(ConfigError::Invalid(
                "events.min_total_count must be finite".to_string(),
            ));
        }
        self.logging.min_level()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
