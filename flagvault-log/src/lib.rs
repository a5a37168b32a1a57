//! FlagVault logging setup
//!
//! Library crates in the workspace only emit `tracing` events. Binaries call
//! [`init`] once to install a subscriber configured from the environment.
//!
//! # Usage
//!
//! ```rust,no_run
//! use flagvault_log::{init, LogConfig};
//!
//! let config = LogConfig::from_env();
//! init(&config).ok();
//! tracing::info!(flag = "new-checkout", "rollout evaluated");
//! ```
//!
//! # Environment Variables
//!
//! - `FLAGVAULT_DEBUG=1` - Enable debug logging
//! - `FLAGVAULT_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `FLAGVAULT_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `FLAGVAULT_LOG_COLOR=1|0` - Enable/disable colors (`NO_COLOR` is honoured)
//! - `RUST_LOG` - Full filter directives, overrides the level above

use std::env;
use std::fmt;
use std::io::IsTerminal;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt as fmt_layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level of events that are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl Level {
    /// Filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level or format name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log {kind}: '{value}'")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl FromStr for Level {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            _ => Err(ParseError {
                kind: "level",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line, human oriented
    Pretty,
    /// Single line per event
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            _ => Err(ParseError {
                kind: "format",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether debug mode is enabled
    pub debug: bool,
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether ANSI colors are written
    pub color: bool,
    /// Whether the event target (module path) is included
    pub target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Warn,
            format: Format::Compact,
            color: false,
            target: true,
        }
    }
}

impl LogConfig {
    /// Read configuration from `FLAGVAULT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok(), std::io::stderr().is_terminal())
    }

    /// Build configuration from an arbitrary variable lookup. `tty` decides
    /// the color default when neither `FLAGVAULT_LOG_COLOR` nor `NO_COLOR`
    /// is set. Unrecognised values fall back to defaults.
    pub fn from_lookup<F>(lookup: F, tty: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let debug = lookup("FLAGVAULT_DEBUG").is_some_and(|v| truthy(&v));

        let level = lookup("FLAGVAULT_LOG_LEVEL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { defaults.level });

        let format = lookup("FLAGVAULT_LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.format);

        let color = match lookup("FLAGVAULT_LOG_COLOR") {
            Some(v) => truthy(&v),
            None => tty && lookup("NO_COLOR").is_none(),
        };

        let target = lookup("FLAGVAULT_LOG_TARGET").is_none_or(|v| truthy(&v));

        Self {
            debug,
            level,
            format,
            color,
            target,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Filter for this configuration. `RUST_LOG` wins when it is set and
    /// parses.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| self.default_filter())
    }

    /// Filter built from `level` alone.
    pub fn default_filter(&self) -> EnvFilter {
        EnvFilter::new(self.level.as_str())
    }
}

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

// ============================================================================
// Initialization
// ============================================================================

/// Install the global subscriber, writing to stderr.
///
/// Fails if a global subscriber is already set.
pub fn init(config: &LogConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(config.filter());

    match config.format {
        Format::Pretty => registry
            .with(
                fmt_layer::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_ansi(config.color)
                    .with_target(config.target),
            )
            .try_init()?,
        Format::Compact => registry
            .with(
                fmt_layer::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_ansi(config.color)
                    .with_target(config.target),
            )
            .try_init()?,
        Format::Json => registry
            .with(
                fmt_layer::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(config.target),
            )
            .try_init()?,
    }

    tracing::debug!(level = %config.level, format = ?config.format, "logging initialized");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
