//! # xsd-engine
//!
//! An XML Schema 1.0 validation engine.
//!
//! A schema is compiled once into an immutable [`Grammar`], from a URI, from
//! text or from an already parsed [`Document`]. The grammar can then validate
//! any number of documents, from any number of threads. Each run reports its
//! findings as [`Diagnostic`]s and the document is valid iff none of them is
//! an error.
//!
//! ## Example
//!
//! ```rust
//! use xsd_engine::{compile_from_text, validate, Document};
//!
//! let grammar = compile_from_text(
//!     r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
//!          <xs:element name="a" type="xs:integer"/>
//!        </xs:schema>"#,
//! )?;
//! let document = Document::from_string("<a>42</a>")?;
//!
//! let mut messages = Vec::new();
//! let mut sink = |message: &str, is_error: bool| messages.push((message.to_string(), is_error));
//! assert!(validate(&grammar, &document, Some(&mut sink)));
//! assert!(messages.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and resources
pub mod namespaces;
pub mod names;
pub mod locations;
pub mod loaders;
pub mod documents;

// Schema components, compiler and evaluator
pub mod validators;
pub mod diagnostics;

// Re-exports for convenience
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity, StderrSink};
pub use documents::{Document, Element};
pub use error::{CompileError, Error, ParseError, Result, ValidationError};
pub use limits::Limits;
pub use namespaces::QName;
pub use validators::{
    CompileOptions, ContextState, Grammar, SchemaSource, ValidationContext, ValidationOptions,
    ValidationReport, ValidationSummary,
};

/// Version of the xsd-engine library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile a schema from any source with default options
pub fn compile(source: SchemaSource<'_>) -> std::result::Result<Grammar, CompileError> {
    compile_with_options(source, &CompileOptions::default())
}

/// Compile a schema from any source
pub fn compile_with_options(
    source: SchemaSource<'_>,
    options: &CompileOptions,
) -> std::result::Result<Grammar, CompileError> {
    validators::compile_schema(source, options)
}

/// Compile the schema at a file path or `file:` URL.
///
/// Relative `xs:include` and `xs:import` locations resolve against it.
pub fn compile_from_uri(uri: &str) -> std::result::Result<Grammar, CompileError> {
    compile(SchemaSource::Uri(uri))
}

/// Compile a schema held in memory
pub fn compile_from_text(text: &str) -> std::result::Result<Grammar, CompileError> {
    compile(SchemaSource::Text(text))
}

/// Compile a schema from a parsed document whose root is `xs:schema`
pub fn compile_from_document(document: &Document) -> std::result::Result<Grammar, CompileError> {
    compile(SchemaSource::Document(document))
}

/// Validate a document, returning true iff no error was reported.
///
/// Diagnostics go to `sink` as they are found, or to standard error when no
/// sink is given.
pub fn validate(
    grammar: &Grammar,
    document: &Document,
    sink: Option<&mut dyn DiagnosticSink>,
) -> bool {
    validate_with_options(grammar, document, sink, &ValidationOptions::default()).valid
}

/// Validate a document with explicit options
pub fn validate_with_options(
    grammar: &Grammar,
    document: &Document,
    sink: Option<&mut dyn DiagnosticSink>,
    options: &ValidationOptions,
) -> ValidationSummary {
    let mut stderr = StderrSink;
    let sink: &mut dyn DiagnosticSink = match sink {
        Some(sink) => sink,
        None => &mut stderr,
    };
    ValidationContext::new(sink, options.clone()).run(grammar, document)
}
