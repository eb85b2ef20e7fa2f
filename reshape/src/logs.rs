//! Leveled console logging for pipeline runs.
//!
//! Every entry goes through one global [`LogSink`], which prints it to stderr
//! (stdout stays free for command output). A silenced sink only prints errors.

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;

/// Log level for console display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn marker(self) -> &'static str {
        match self {
            LogLevel::Info => "",
            LogLevel::Success => "✓",
            LogLevel::Warning => "⚠️",
            LogLevel::Error => "❌",
        }
    }
}

/// One line of console output, nested `indent` levels deep
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub indent: u8,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Render the entry the way the sink prints it.
    pub fn render(&self) -> String {
        format!(
            "{}   {} {}",
            "   ".repeat(self.indent as usize),
            self.level.marker(),
            self.message
        )
    }
}

/// Global log sink
pub static LOG_SINK: Lazy<LogSink> = Lazy::new(LogSink::new);

/// Prints log entries to stderr
pub struct LogSink {
    quiet: AtomicBool,
}

impl LogSink {
    pub fn new() -> Self {
        Self { quiet: AtomicBool::new(false) }
    }

    /// Print a log entry if its level gets through.
    pub fn log(&self, entry: LogEntry) {
        if self.prints(entry.level) {
            eprintln!("{}", entry.render());
        }
    }

    /// A quiet sink still prints errors.
    pub fn prints(&self, level: LogLevel) -> bool {
        !self.is_quiet() || level == LogLevel::Error
    }

    pub fn set_quiet(&self, quiet: bool) {
        self.quiet.store(quiet, Ordering::Relaxed);
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet.load(Ordering::Relaxed)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Silence (or re-enable) progress logging
pub fn set_quiet(quiet: bool) {
    LOG_SINK.set_quiet(quiet);
}

pub fn log_info(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_SINK.log(LogEntry::new(LogLevel::Info, msg).with_indent(indent));
}
