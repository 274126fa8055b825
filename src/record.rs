use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Ordered severity scale used by incoming records.
///
/// The ordering matters: error-reporting enrichment fires for every record
/// whose severity is at or above the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Severity {
    /// Canonical upper-case name, matching the Cloud Logging severity set.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }

    /// Parse a severity name, case-insensitively. Returns `None` for
    /// unrecognized names so callers can fall back to their own default.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Severity::Debug),
            "INFO" => Some(Severity::Info),
            "NOTICE" => Some(Severity::Notice),
            "WARNING" => Some(Severity::Warning),
            "ERROR" => Some(Severity::Error),
            "CRITICAL" => Some(Severity::Critical),
            "ALERT" => Some(Severity::Alert),
            "EMERGENCY" => Some(Severity::Emergency),
            _ => None,
        }
    }

    /// Map a `tracing` level onto this scale. `TRACE` collapses into
    /// `DEBUG`; the remaining levels map one-to-one.
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::INFO => Severity::Info,
            _ => Severity::Debug,
        }
    }
}

/// One frame of an exception's call stack.
#[derive(Debug, Clone, Serialize)]
pub struct StackFrame {
    pub class: Option<String>,
    pub function: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// Error information attached to a record, either supplied by the caller
/// through context or synthesized from the record's message.
#[derive(Debug, Clone, Serialize)]
pub struct ExceptionInfo {
    pub message: String,
    pub file: String,
    pub line: u32,
    pub trace: Vec<StackFrame>,
}

impl ExceptionInfo {
    /// Synthesize an exception from a bare message with an empty trace.
    ///
    /// `file` and `line` reflect the call site of this constructor, not the
    /// true origin of the logged condition. This loses the real source
    /// location; it is the documented fallback when an error-level record
    /// carries no exception of its own.
    #[track_caller]
    pub fn from_message(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        ExceptionInfo {
            message: message.into(),
            file: location.file().to_string(),
            line: location.line(),
            trace: Vec::new(),
        }
    }

    /// Name of the function the exception originated in, derived from the
    /// first stack frame: `Class::function` when the frame names a class,
    /// bare `function` otherwise, empty string when the trace is empty.
    pub fn calling_function(&self) -> String {
        let Some(frame) = self.trace.first() else {
            return String::new();
        };
        let mut name = String::new();
        if let Some(class) = &frame.class {
            name.push_str(class);
            name.push_str("::");
        }
        if let Some(function) = &frame.function {
            name.push_str(function);
        }
        name
    }

    /// Render the exception as a JSON value for generic serialization.
    /// The trace is included only when `include_stacktraces` is set.
    pub fn to_value(&self, include_stacktraces: bool) -> Value {
        let mut value = json!({
            "message": self.message,
            "file": self.file,
            "line": self.line,
        });
        if include_stacktraces {
            if let Some(map) = value.as_object_mut() {
                map.insert(
                    "trace".to_string(),
                    serde_json::to_value(&self.trace).unwrap_or(Value::Null),
                );
            }
        }
        value
    }
}

/// A single context entry. Context is a closed sum: either plain data that
/// flattens into the output as-is, or a structured exception.
#[derive(Debug, Clone)]
pub enum ContextValue {
    Data(Value),
    Exception(ExceptionInfo),
}

/// Structured log record handed to the enricher, one per logging call.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    /// Level name as the producing framework spelled it; copied verbatim
    /// into the output `severity` field.
    pub level_name: String,
    pub message: String,
    pub channel: Option<String>,
    pub context: BTreeMap<String, ContextValue>,
    /// Additional top-level fields. Context entries win on key collision.
    pub extra: BTreeMap<String, Value>,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            severity,
            level_name: severity.as_str().to_string(),
            message: message.into(),
            channel: None,
            context: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_follows_the_tiers() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
        assert!(Severity::Alert < Severity::Emergency);
    }

    #[test]
    fn severity_names_round_trip() {
        for severity in [
            Severity::Debug,
            Severity::Info,
            Severity::Notice,
            Severity::Warning,
            Severity::Error,
            Severity::Critical,
            Severity::Alert,
            Severity::Emergency,
        ] {
            assert_eq!(Severity::from_name(severity.as_str()), Some(severity));
        }
        assert_eq!(Severity::from_name("error"), Some(Severity::Error));
        assert_eq!(Severity::from_name("bogus"), None);
    }

    #[test]
    fn synthesized_exception_carries_call_site() {
        let exception = ExceptionInfo::from_message("boom");
        assert_eq!(exception.message, "boom");
        assert!(!exception.file.is_empty());
        assert!(exception.line > 0);
        assert!(exception.trace.is_empty());
        assert_eq!(exception.calling_function(), "");
    }

    #[test]
    fn calling_function_prefixes_class() {
        let mut exception = ExceptionInfo::from_message("x");
        exception.trace.push(StackFrame {
            class: Some("App\\Handler".to_string()),
            function: Some("run".to_string()),
            file: None,
            line: None,
        });
        assert_eq!(exception.calling_function(), "App\\Handler::run");

        exception.trace[0].class = None;
        assert_eq!(exception.calling_function(), "run");
    }

    #[test]
    fn exception_value_trace_is_opt_in() {
        let mut exception = ExceptionInfo::from_message("x");
        exception.trace.push(StackFrame {
            class: None,
            function: Some("main".to_string()),
            file: Some("main.rs".to_string()),
            line: Some(3),
        });

        let without = exception.to_value(false);
        assert!(without.get("trace").is_none());

        let with = exception.to_value(true);
        assert_eq!(with["trace"][0]["function"], "main");
    }
}
