//! Validation diagnostics
//!
//! Every finding of a validation run is a [`Diagnostic`]. Diagnostics are
//! delivered to a [`DiagnosticSink`] one at a time, in document order, as
//! they are produced. When the caller supplies no sink they are rendered to
//! standard error instead.

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Makes the document invalid
    Error,
    /// Reported, but does not affect validity
    Warning,
}

impl Severity {
    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Human-readable message
    pub message: String,
    /// Error or warning
    pub severity: Severity,
    /// Path of the offending node, e.g. `/order/item[2]/@sku`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<String>,
}

impl Diagnostic {
    /// Create an error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            location: None,
        }
    }

    /// Create a warning
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
            location: None,
        }
    }

    /// Set the node path
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Check if this diagnostic is an error
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}: {}", location, self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Receiver of diagnostics, called once per diagnostic as it is produced
pub trait DiagnosticSink {
    /// Accept one diagnostic
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Callbacks receive the rendered message and whether it is an error
impl<F> DiagnosticSink for F
where
    F: FnMut(&str, bool),
{
    fn report(&mut self, diagnostic: &Diagnostic) {
        let message = match &diagnostic.location {
            Some(location) => format!("{}: {}", location, diagnostic.message),
            None => diagnostic.message.clone(),
        };
        self(&message, diagnostic.is_error());
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

/// Default sink: one line per diagnostic on standard error
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        // Nothing sensible to do when stderr is gone
        let _ = writeln!(handle, "{}", diagnostic);
    }
}

/// Forwards diagnostics to a sink while counting them by severity
pub(crate) struct Reporter<'s> {
    sink: &'s mut dyn DiagnosticSink,
    errors: usize,
    warnings: usize,
}

impl<'s> Reporter<'s> {
    pub(crate) fn new(sink: &'s mut dyn DiagnosticSink) -> Self {
        Self {
            sink,
            errors: 0,
            warnings: 0,
        }
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        self.sink.report(&diagnostic);
    }

    pub(crate) fn error(&mut self, location: &str, message: impl Into<String>) {
        self.report(Diagnostic::error(message).at(location));
    }

    pub(crate) fn warning(&mut self, location: &str, message: impl Into<String>) {
        self.report(Diagnostic::warning(message).at(location));
    }

    pub(crate) fn error_count(&self) -> usize {
        self.errors
    }

    pub(crate) fn warning_count(&self) -> usize {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display() {
        let d = Diagnostic::error("missing required element b").at("/a");
        assert_eq!(d.to_string(), "/a: error: missing required element b");
        assert_eq!(Diagnostic::warning("w").to_string(), "warning: w");
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |message: &str, is_error: bool| seen.push((message.to_string(), is_error));
            let mut reporter = Reporter::new(&mut sink);
            reporter.error("/a", "bad");
            reporter.warning("/a/b", "odd");
            assert_eq!(reporter.error_count(), 1);
            assert_eq!(reporter.warning_count(), 1);
        }
        assert_eq!(
            seen,
            vec![("/a: bad".to_string(), true), ("/a/b: odd".to_string(), false)]
        );
    }

    #[test]
    fn test_vec_sink_keeps_order() {
        let mut collected: Vec<Diagnostic> = Vec::new();
        let mut reporter = Reporter::new(&mut collected);
        reporter.warning("/r", "first");
        reporter.error("/r/x", "second");
        drop(reporter);
        let messages: Vec<&str> = collected.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert!(collected[1].is_error());
    }

    #[test]
    fn test_serialize() {
        let d = Diagnostic::error("bad value").at("/a/@id");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(
            json,
            r#"{"message":"bad value","severity":"error","location":"/a/@id"}"#
        );
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
