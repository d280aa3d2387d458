//! Structured logging for refit.
//!
//! A small leveled logger with component/field context and console or JSON
//! output. The engine receives a `Logger` by value in its constructor; there
//! is no global logger state.

use std::fmt;
use std::io::Write;

use crate::config::LoggingSection;

// ---------------------------------------------------------------------------
// Log level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// Parse a log level string (case-insensitive, defaults to Info).
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().trim() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            "fatal" => Self::Fatal,
            _ => Self::Info,
        }
    }

    /// Returns true if a message at `msg_level` passes this filter level.
    pub fn should_log(self, msg_level: LogLevel) -> bool {
        msg_level >= self
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Log format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Console,
    Json,
}

impl LogFormat {
    /// Parse a format string (defaults to Console).
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().trim() {
            "json" => Self::Json,
            _ => Self::Console,
        }
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Resolved logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Console,
        }
    }
}

impl LoggingConfig {
    /// Resolve the effective logging config from the file section and CLI
    /// overrides (CLI wins when non-empty).
    pub fn resolve(section: &LoggingSection, cli_level: &str, cli_format: &str) -> Self {
        let level = if cli_level.is_empty() {
            &section.level
        } else {
            cli_level
        };
        let format = if cli_format.is_empty() {
            &section.format
        } else {
            cli_format
        };
        Self {
            level: LogLevel::parse(level),
            format: LogFormat::parse(format),
        }
    }
}

/// A structured logger with component/field context.
#[derive(Debug, Clone)]
pub struct Logger {
    level: LogLevel,
    format: LogFormat,
    fields: Vec<(String, String)>,
}

impl Logger {
    pub fn new(cfg: &LoggingConfig) -> Self {
        Self {
            level: cfg.level,
            format: cfg.format,
            fields: Vec::new(),
        }
    }

    /// A logger that drops everything below Fatal; useful in tests.
    pub fn disabled() -> Self {
        Self {
            level: LogLevel::Fatal,
            format: LogFormat::Console,
            fields: Vec::new(),
        }
    }

    /// Create a child logger with an additional field.
    pub fn with_field(&self, key: &str, value: &str) -> Self {
        let mut child = self.clone();
        child.fields.push((key.to_string(), value.to_string()));
        child
    }

    /// Create a child logger for a named component.
    pub fn component(&self, name: &str) -> Self {
        self.with_field("component", name)
    }

    /// Log a message at the given level.
    pub fn log(&self, level: LogLevel, msg: &str) {
        self.log_with_fields(level, msg, &[]);
    }

    /// Log a message with extra inline fields.
    pub fn log_with_fields(&self, level: LogLevel, msg: &str, extra: &[(&str, &str)]) {
        if !self.level.should_log(level) {
            return;
        }

        let stderr = std::io::stderr();
        let mut handle = stderr.lock();

        match self.format {
            LogFormat::Console => {
                let now = chrono::Utc::now().format("%H:%M:%S");
                let _ = write!(handle, "{now} {level} ");
                for (k, v) in &self.fields {
                    let _ = write!(handle, "{k}={v} ");
                }
                for (k, v) in extra {
                    let _ = write!(handle, "{k}={v} ");
                }
                let _ = writeln!(handle, "{msg}");
            }
            LogFormat::Json => {
                let _ = write!(
                    handle,
                    "{{\"time\":\"{}\",\"level\":\"{}\"",
                    chrono::Utc::now().to_rfc3339(),
                    level,
                );
                for (k, v) in &self.fields {
                    let _ = write!(handle, ",\"{k}\":\"{v}\"");
                }
                for (k, v) in extra {
                    let _ = write!(handle, ",\"{k}\":\"{v}\"");
                }
                let _ = writeln!(handle, ",\"message\":\"{msg}\"}}");
            }
        }
    }

    // Convenience methods

    pub fn trace(&self, msg: &str) {
        self.log(LogLevel::Trace, msg);
    }

    pub fn debug(&self, msg: &str) {
        self.log(LogLevel::Debug, msg);
    }

    pub fn info(&self, msg: &str) {
        self.log(LogLevel::Info, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.log(LogLevel::Warn, msg);
    }

    pub fn error(&self, msg: &str) {
        self.log(LogLevel::Error, msg);
    }

    pub fn debug_with(&self, msg: &str, fields: &[(&str, &str)]) {
        self.log_with_fields(LogLevel::Debug, msg, fields);
    }

    pub fn info_with(&self, msg: &str, fields: &[(&str, &str)]) {
        self.log_with_fields(LogLevel::Info, msg, fields);
    }

    pub fn warn_with(&self, msg: &str, fields: &[(&str, &str)]) {
        self.log_with_fields(LogLevel::Warn, msg, fields);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
