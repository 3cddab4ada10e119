//! Structured JSON logger
//!
//! - One log line = one JSON object.
//! - Fields are emitted in deterministic (alphabetical) order.
//! - Synchronous, unbuffered: a log call is one `write_all` + flush.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail.
    Trace = 0,
    /// Normal operations.
    Info = 1,
    /// Recoverable issues.
    Warn = 2,
    /// Operation failures, recovered locally.
    Error = 3,
    /// Unrecoverable, process exits.
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that writes one JSON object per line to an
/// injected sink, gated by a minimum severity.
///
/// Cloned/shared as `Arc<Logger>` across tasks; the inner writer is
/// behind a `Mutex` so concurrent log calls never interleave output.
pub struct Logger {
    min_severity: Severity,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    /// Creates a logger writing to stderr, at the given minimum severity.
    pub fn stderr(min_severity: Severity) -> Self {
        Self::new(min_severity, Box::new(io::stderr()))
    }

    /// Creates a logger writing to an arbitrary sink (used by tests to
    /// capture output).
    pub fn new(min_severity: Severity, sink: Box<dyn Write + Send>) -> Self {
        Self {
            min_severity,
            sink: Mutex::new(sink),
        }
    }

    /// Logs an event with the given severity and fields.
    ///
    /// Fields are emitted in alphabetical key order regardless of the
    /// order passed in, so two calls with the same field set always
    /// produce byte-identical output.
    pub fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity < self.min_severity {
            return;
        }

        let mut output = String::with_capacity(256);
        output.push('{');

        output.push_str("\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push('"');

        output.push_str(",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push('}');
        output.push('\n');

        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.write_all(output.as_bytes());
            let _ = sink.flush();
        }
    }

    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }

    /// Logs at TRACE level.
    pub fn trace(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Trace, event, fields);
    }

    /// Logs at INFO level.
    pub fn info(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Info, event, fields);
    }

    /// Logs at WARN level.
    pub fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Warn, event, fields);
    }

    /// Logs at ERROR level.
    pub fn error(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Error, event, fields);
    }

    /// Logs at FATAL level.
    pub fn fatal(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Fatal, event, fields);
    }
}
