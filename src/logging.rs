/// Structured logging for the DSD service
///
/// Provides context-rich logging with pipeline stage and station
/// identifiers, timestamps, and severity levels. Supports both console
/// output and file-based logging for batch runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Spectrum,
    Integrator,
    Events,
    Climatology,
    Config,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Spectrum => write!(f, "ND"),
            Stage::Integrator => write!(f, "BULK"),
            Stage::Events => write!(f, "EVENTS"),
            Stage::Climatology => write!(f, "CLIM"),
            Stage::Config => write!(f, "CFG"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut guard) = LOGGER.lock() {
            *guard = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, stage: Stage, station: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, stage, station_part, message)
    }

    /// Log a message with the global logger
    fn log(&self, level: LogLevel, stage: Stage, station: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, stage, station, message);
        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output goes to stderr; stdout carries the JSON report.
        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, station_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, station_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}", message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, stage: Stage, station: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, stage, station, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, stage, station, message);
}

/// Log a warning message
pub fn warn(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, stage, station, message);
}

/// Log an error message
pub fn error(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, stage, station, message);
}

/// Log a debug message
pub fn debug(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, stage, station, message);
}

// ---------------------------------------------------------------------------
// Stage Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a pipeline stage over a time series.
///
/// `undefined` counts steps whose output had to be reported as missing.
pub fn log_stage_summary(stage: Stage, station: Option<&str>, total: usize, undefined: usize) {
    let message = format!(
        "Processed {} steps, {} with undefined values",
        total, undefined
    );

    if undefined == 0 {
        info(stage, station, &message);
    } else if undefined == total {
        warn(stage, station, &message);
    } else {
        debug(stage, station, &message);
    }
}
