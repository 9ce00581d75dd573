//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` first, then `severity`, then fields sorted by key
//! - Synchronous, no buffering
//! - Info and below go to stdout, errors to stderr

use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Diagnostic detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, startup aborts
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn to_stderr(self) -> bool {
        self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity.to_stderr() {
            Self::log_to(severity, event, fields, &mut io::stderr());
        } else {
            Self::log_to(severity, event, fields, &mut io::stdout());
        }
    }

    /// Log to an arbitrary writer
    ///
    /// Write failures are ignored: logging never fails the caller.
    pub fn log_to<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let line = Self::format_line(severity, event, fields);
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// Render one log line, including the trailing newline
    pub fn format_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(128);

        output.push_str("{\"event\":\"");
        escape_json_string(&mut output, event);
        output.push_str("\",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted {
            output.push_str(",\"");
            escape_json_string(&mut output, key);
            output.push_str("\":\"");
            escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push_str("}\n");
        output
    }

    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_stderr_routing() {
        assert!(!Severity::Warn.to_stderr());
        assert!(Severity::Error.to_stderr());
        assert!(Severity::Fatal.to_stderr());
    }

    #[test]
    fn test_line_is_json() {
        let line = Logger::format_line(
            Severity::Info,
            "RESTART_JOBS_LOADED",
            &[("count", "2")],
        );
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "RESTART_JOBS_LOADED");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["count"], "2");
    }

    #[test]
    fn test_fields_sorted_and_single_line() {
        let a = Logger::format_line(Severity::Warn, "E", &[("z", "1"), ("a", "2")]);
        let b = Logger::format_line(Severity::Warn, "E", &[("a", "2"), ("z", "1")]);
        assert_eq!(a, b);
        assert!(a.find("\"a\"").unwrap() < a.find("\"z\"").unwrap());
        assert_eq!(a.matches('\n').count(), 1);
    }

    #[test]
    fn test_escaping() {
        let line = Logger::format_line(
            Severity::Error,
            "E",
            &[("error", "lookup \"job\":\n\tgone\u{1}")],
        );
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["error"], "lookup \"job\":\n\tgone\u{1}");
    }

    #[test]
    fn test_log_to_writer() {
        let mut buffer = Vec::new();
        Logger::log_to(Severity::Trace, "E", &[], &mut buffer);
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "{\"event\":\"E\",\"severity\":\"TRACE\"}\n"
        );
    }
}
