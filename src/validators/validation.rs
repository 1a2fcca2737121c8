//! XML Validation Infrastructure
//!
//! A [`ValidationContext`] carries the state of one validation run: the
//! element path used to locate diagnostics, the ID table, and the reporter
//! that forwards diagnostics to the caller's sink. A context is created,
//! run once, and consumed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::document_validation::validate_document;
use super::grammar::Grammar;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Reporter};
use crate::documents::Document;
use crate::limits::Limits;

/// Options for a validation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Resource limits (nesting depth, matcher step budget)
    pub limits: Limits,
}

impl ValidationOptions {
    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

/// Lifecycle of a validation context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created, not yet run
    Created,
    /// Walking the document
    Running,
    /// Finished; the summary is final
    Completed,
}

/// Counts produced by a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// True iff no error was reported
    pub valid: bool,
    /// Number of errors
    pub error_count: usize,
    /// Number of warnings
    pub warning_count: usize,
}

/// Diagnostics of a run collected into a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True iff `diagnostics` holds no error
    pub valid: bool,
    /// All diagnostics in document order
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Error diagnostics
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Warning diagnostics
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }
}

impl Grammar {
    /// Validate a document, collecting diagnostics into a report
    pub fn validate(&self, document: &Document) -> ValidationReport {
        self.validate_with_options(document, &ValidationOptions::default())
    }

    /// Validate a document with explicit options
    pub fn validate_with_options(
        &self,
        document: &Document,
        options: &ValidationOptions,
    ) -> ValidationReport {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let summary = ValidationContext::new(&mut diagnostics, options.clone()).run(self, document);
        ValidationReport {
            valid: summary.valid,
            diagnostics,
        }
    }
}

/// State of one validation run
pub struct ValidationContext<'s> {
    state: ContextState,
    options: ValidationOptions,
    reporter: Reporter<'s>,
    /// Element path segments from the root
    path: Vec<String>,
    ids: HashSet<String>,
    /// IDREF values with the location they were found at
    idrefs: Vec<(String, String)>,
}

impl<'s> ValidationContext<'s> {
    /// Create a context reporting into `sink`
    pub fn new(sink: &'s mut dyn DiagnosticSink, options: ValidationOptions) -> Self {
        Self {
            state: ContextState::Created,
            options,
            reporter: Reporter::new(sink),
            path: Vec::new(),
            ids: HashSet::new(),
            idrefs: Vec::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Validate `document` against `grammar`, consuming the context
    pub fn run(mut self, grammar: &Grammar, document: &Document) -> ValidationSummary {
        self.transition(ContextState::Running);
        validate_document(&mut self, grammar, document);
        self.check_idrefs();
        self.transition(ContextState::Completed);

        let summary = ValidationSummary {
            valid: self.reporter.error_count() == 0,
            error_count: self.reporter.error_count(),
            warning_count: self.reporter.warning_count(),
        };
        debug!(
            valid = summary.valid,
            errors = summary.error_count,
            warnings = summary.warning_count,
            "validation completed"
        );
        summary
    }

    fn transition(&mut self, next: ContextState) {
        trace!(from = ?self.state, to = ?next, "validation context state");
        self.state = next;
    }

    pub(crate) fn limits(&self) -> &Limits {
        &self.options.limits
    }

    // =========================================================================
    // Element path
    // =========================================================================

    /// Enter a child element given its path segment
    pub(crate) fn enter(&mut self, segment: String) {
        self.path.push(segment);
    }

    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    /// Nesting depth of the current element, the root being 1
    pub(crate) fn depth(&self) -> usize {
        self.path.len()
    }

    /// Path of the current element, e.g. `/order/item[2]`
    pub(crate) fn location(&self) -> String {
        if self.path.is_empty() {
            return "/".to_string();
        }
        self.path.iter().fold(String::new(), |mut path, segment| {
            path.push('/');
            path.push_str(segment);
            path
        })
    }

    /// Path of an attribute of the current element
    pub(crate) fn attribute_location(&self, local_name: &str) -> String {
        format!("{}/@{}", self.location(), local_name)
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        self.reporter.report(diagnostic);
    }

    /// Error at the current element
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let location = self.location();
        self.reporter.error(&location, message);
    }

    pub(crate) fn error_at(&mut self, location: &str, message: impl Into<String>) {
        self.reporter.error(location, message);
    }

    /// Warning at the current element
    pub(crate) fn warning(&mut self, message: impl Into<String>) {
        let location = self.location();
        self.reporter.warning(&location, message);
    }

    pub(crate) fn warning_at(&mut self, location: &str, message: impl Into<String>) {
        self.reporter.warning(location, message);
    }

    // =========================================================================
    // ID / IDREF
    // =========================================================================

    /// Record an ID value; duplicates are errors
    pub(crate) fn register_id(&mut self, value: &str, location: &str) {
        if !self.ids.insert(value.to_string()) {
            self.error_at(location, format!("duplicate ID value '{}'", value));
        }
    }

    /// Record an IDREF value, resolved once the traversal is done
    pub(crate) fn register_idref(&mut self, value: &str, location: &str) {
        self.idrefs.push((value.to_string(), location.to_string()));
    }

    /// Reported after every traversal diagnostic
    fn check_idrefs(&mut self) {
        for (value, location) in std::mem::take(&mut self.idrefs) {
            if !self.ids.contains(&value) {
                self.error_at(
                    &location,
                    format!("IDREF '{}' does not match any ID in the document", value),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_locations() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let mut ctx = ValidationContext::new(&mut sink, ValidationOptions::default());
        assert_eq!(ctx.state(), ContextState::Created);
        assert_eq!(ctx.location(), "/");
        ctx.enter("order".to_string());
        ctx.enter("item[2]".to_string());
        assert_eq!(ctx.location(), "/order/item[2]");
        assert_eq!(ctx.attribute_location("sku"), "/order/item[2]/@sku");
        assert_eq!(ctx.depth(), 2);
        ctx.leave();
        assert_eq!(ctx.location(), "/order");
    }

    #[test]
    fn test_ids_and_idrefs() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let mut ctx = ValidationContext::new(&mut sink, ValidationOptions::default());
        ctx.register_id("a", "/r/x[1]/@id");
        ctx.register_id("a", "/r/x[2]/@id");
        ctx.register_idref("a", "/r/@ref");
        ctx.register_idref("b", "/r/@other");
        ctx.check_idrefs();
        drop(ctx);

        let rendered: Vec<String> = sink.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "/r/x[2]/@id: error: duplicate ID value 'a'",
                "/r/@other: error: IDREF 'b' does not match any ID in the document",
            ]
        );
    }
}
