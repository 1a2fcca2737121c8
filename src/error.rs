//! Error types for xsd-engine
//!
//! Three families of failure live here:
//!
//! - [`Error`] for the document model and resource loading,
//! - [`CompileError`] for schema compilation, which is always fatal,
//! - [`ValidationError`] for a single value rejected by a datatype or facet.
//!
//! Validation of a document never fails as a whole; it produces
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s instead.

use std::fmt;
use thiserror::Error;

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Result of checking a single lexical value against a datatype or facet
pub type ValueResult<T> = std::result::Result<T, ValidationError>;

/// Error type for document parsing and resource loading
#[derive(Error, Debug)]
pub enum Error {
    /// XML well-formedness error
    #[error("XML error: {0}")]
    Xml(String),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// Value error (invalid configuration or literal)
    #[error("value error: {0}")]
    Value(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Schema compilation failure.
///
/// Compilation aborts on the first of these; no partial grammar is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The schema source is not well-formed XML or is not an `xs:schema`
    #[error("syntax error: {0}")]
    SyntaxError(ParseError),

    /// A `type`, `base`, `ref`, `itemType`, `memberTypes` or
    /// `substitutionGroup` reference names no component
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// A type derives from itself through its base chain
    #[error("cyclic type derivation involving '{0}'")]
    CyclicDerivation(String),

    /// A model group or attribute group references itself
    #[error("circular group reference involving '{0}'")]
    CircularGroup(String),

    /// Two top-level components share a kind and a qualified name
    #[error("duplicate global component: {0}")]
    DuplicateComponent(String),

    /// The schema is well-formed XML but breaks an XSD structural rule
    #[error("invalid schema: {0}")]
    InvalidSchema(ParseError),

    /// The source is empty or has no root element
    #[error("empty schema source")]
    EmptySource,

    /// A schema document (main, included or imported) could not be loaded
    #[error("resource error: {0}")]
    Resource(String),

    /// A configured limit was exceeded while compiling
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

impl CompileError {
    /// Shorthand for an [`CompileError::InvalidSchema`] with a bare message
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidSchema(ParseError::new(message))
    }

    /// Shorthand for a [`CompileError::SyntaxError`] with a bare message
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::SyntaxError(ParseError::new(message))
    }
}

impl From<Error> for CompileError {
    fn from(err: Error) -> Self {
        match err {
            Error::Xml(msg) => CompileError::SyntaxError(ParseError::new(msg)),
            Error::Namespace(msg) | Error::Name(msg) => {
                CompileError::SyntaxError(ParseError::new(msg))
            }
            Error::LimitExceeded(msg) => CompileError::LimitExceeded(msg),
            other => CompileError::Resource(other.to_string()),
        }
    }
}

/// A value rejected by a datatype or a constraining facet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// Name of the facet or datatype that rejected the value
    pub facet: Option<String>,
    /// Additional explanation
    pub reason: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            facet: None,
            reason: None,
        }
    }

    /// Set the facet that failed
    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = Some(facet.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref facet) = self.facet {
            write!(f, "facet '{}': ", facet)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(ref reason) = self.reason {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Schema parsing error with an optional location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the schema source
    pub location: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref loc) = self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("value 'abc' is not in the enumeration")
            .with_facet("enumeration")
            .with_reason("allowed: [\"a\", \"b\"]");

        let msg = format!("{}", err);
        assert!(msg.starts_with("facet 'enumeration': "));
        assert!(msg.contains("not in the enumeration"));
        assert!(msg.contains("allowed"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("Invalid schema syntax").with_location("/xs:schema/xs:element[2]");

        let msg = format!("{}", err);
        assert!(msg.contains("Invalid schema syntax"));
        assert!(msg.contains("at /xs:schema"));
    }

    #[test]
    fn test_error_conversion() {
        let err: CompileError = Error::Xml("unexpected end of input".to_string()).into();
        assert!(matches!(err, CompileError::SyntaxError(_)));

        let err: CompileError = Error::Resource("missing".to_string()).into();
        assert!(matches!(err, CompileError::Resource(_)));

        let err: CompileError = Error::LimitExceeded("too deep".to_string()).into();
        assert_eq!(err, CompileError::LimitExceeded("too deep".to_string()));
    }

    #[test]
    fn test_compile_error_messages() {
        let err = CompileError::UnresolvedReference("{urn:x}missingType".to_string());
        assert_eq!(err.to_string(), "unresolved reference: {urn:x}missingType");
        assert_eq!(CompileError::EmptySource.to_string(), "empty schema source");
    }
}
