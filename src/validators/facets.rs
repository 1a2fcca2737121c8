//! XSD constraining facets
//!
//! This module implements the facets that constrain simple types. A schema
//! restriction step lists its facets as raw [`FacetSpec`]s; once the base
//! type is final they are compiled into a typed [`Facets`] set.

use crate::error::{CompileError, ValidationError, ValueResult};
use crate::validators::builtins::{
    Primitive, XsdValue, XSD_ENUMERATION, XSD_FRACTION_DIGITS, XSD_LENGTH, XSD_MAX_EXCLUSIVE,
    XSD_MAX_INCLUSIVE, XSD_MAX_LENGTH, XSD_MIN_EXCLUSIVE, XSD_MIN_INCLUSIVE, XSD_MIN_LENGTH,
    XSD_PATTERN, XSD_TOTAL_DIGITS, XSD_WHITE_SPACE,
};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// White space handling modes, ordered from least to most normalizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl FromStr for WhiteSpace {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValueResult<Self> {
        match s {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(ValidationError::new(format!(
                "invalid whiteSpace value '{}': must be 'preserve', 'replace' or 'collapse'",
                s
            ))),
        }
    }
}

impl WhiteSpace {
    /// Normalize a string according to this white space mode
    pub fn normalize(&self, s: &str) -> String {
        match self {
            WhiteSpace::Preserve => s.to_string(),
            WhiteSpace::Replace => s.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => s
                .split(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl fmt::Display for WhiteSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WhiteSpace::Preserve => "preserve",
            WhiteSpace::Replace => "replace",
            WhiteSpace::Collapse => "collapse",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Patterns
// =============================================================================

/// Translate an XSD regular expression into `regex` crate syntax.
///
/// XSD patterns are implicitly anchored, treat `^` and `$` as literals,
/// spell class subtraction as `-[...]` and add the `\i` and `\c` escapes.
pub fn translate_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut chars = pattern.chars().peekable();
    let mut class_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('i') => out.push_str(r"[_:\p{L}]"),
                Some('I') => out.push_str(r"[^_:\p{L}]"),
                Some('c') => out.push_str(r"[-._:\p{L}\p{Nd}\x{B7}]"),
                Some('C') => out.push_str(r"[^-._:\p{L}\p{Nd}\x{B7}]"),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push_str(r"\\"),
            },
            '[' => {
                class_depth += 1;
                out.push('[');
                // A leading caret negates; keep it attached to the bracket
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('^');
                }
            }
            ']' if class_depth > 0 => {
                class_depth -= 1;
                out.push(']');
            }
            '-' if class_depth > 0 && chars.peek() == Some(&'[') => out.push_str("--"),
            '^' if class_depth == 0 => out.push_str(r"\^"),
            '$' if class_depth == 0 => out.push_str(r"\$"),
            '&' | '~' if class_depth > 0 => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Pattern facet: the patterns of one restriction step, any of which may match
#[derive(Debug, Clone)]
pub struct PatternFacet {
    regex: Regex,
    sources: Vec<String>,
}

impl PatternFacet {
    /// Compile the alternatives given in a single restriction step
    pub fn new(patterns: &[String]) -> Result<Self, String> {
        let body = patterns
            .iter()
            .map(|p| format!("(?:{})", translate_pattern(p)))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!("^(?:{})$", body)).map_err(|e| e.to_string())?;
        Ok(Self {
            regex,
            sources: patterns.to_vec(),
        })
    }

    /// Validate a value against this facet
    pub fn validate(&self, value: &str) -> ValueResult<()> {
        if self.regex.is_match(value) {
            Ok(())
        } else {
            Err(
                ValidationError::new(format!(
                    "value '{}' does not match pattern '{}'",
                    value,
                    self.sources.join("' | '")
                ))
                .with_facet(XSD_PATTERN),
            )
        }
    }
}

// =============================================================================
// Enumeration and Bounds
// =============================================================================

/// Enumeration facet: the value must equal one of the listed values
#[derive(Debug, Clone)]
pub struct EnumerationFacet {
    values: Vec<(String, XsdValue)>,
}

impl EnumerationFacet {
    /// Literal values in declaration order
    pub fn literals(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(literal, _)| literal.as_str())
    }

    /// Validate a typed value against this facet
    pub fn validate(&self, lexical: &str, value: &XsdValue) -> ValueResult<()> {
        if self.values.iter().any(|(_, v)| v == value) {
            return Ok(());
        }
        let allowed: Vec<&str> = self.literals().collect();
        Err(ValidationError::new(format!(
            "value '{}' is not one of the enumerated values [{}]",
            lexical,
            allowed.join(", ")
        ))
        .with_facet(XSD_ENUMERATION))
    }
}

/// Kind of range facet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// minInclusive
    MinInclusive,
    /// maxInclusive
    MaxInclusive,
    /// minExclusive
    MinExclusive,
    /// maxExclusive
    MaxExclusive,
}

impl BoundKind {
    fn from_facet(name: &str) -> Option<Self> {
        match name {
            XSD_MIN_INCLUSIVE => Some(BoundKind::MinInclusive),
            XSD_MAX_INCLUSIVE => Some(BoundKind::MaxInclusive),
            XSD_MIN_EXCLUSIVE => Some(BoundKind::MinExclusive),
            XSD_MAX_EXCLUSIVE => Some(BoundKind::MaxExclusive),
            _ => None,
        }
    }

    /// Facet name
    pub fn name(&self) -> &'static str {
        match self {
            BoundKind::MinInclusive => XSD_MIN_INCLUSIVE,
            BoundKind::MaxInclusive => XSD_MAX_INCLUSIVE,
            BoundKind::MinExclusive => XSD_MIN_EXCLUSIVE,
            BoundKind::MaxExclusive => XSD_MAX_EXCLUSIVE,
        }
    }

    /// Whether `value <=> bound == ordering` satisfies the facet
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            BoundKind::MinInclusive => ordering != Ordering::Less,
            BoundKind::MaxInclusive => ordering != Ordering::Greater,
            BoundKind::MinExclusive => ordering == Ordering::Greater,
            BoundKind::MaxExclusive => ordering == Ordering::Less,
        }
    }

    fn relation(&self) -> &'static str {
        match self {
            BoundKind::MinInclusive => ">=",
            BoundKind::MaxInclusive => "<=",
            BoundKind::MinExclusive => ">",
            BoundKind::MaxExclusive => "<",
        }
    }
}

/// A range facet with its typed limit
#[derive(Debug, Clone)]
pub struct BoundFacet {
    /// Which bound
    pub kind: BoundKind,
    /// Limit as written in the schema
    pub literal: String,
    /// Typed limit
    pub value: XsdValue,
}

impl BoundFacet {
    /// Validate a typed value against this facet
    pub fn validate(&self, lexical: &str, value: &XsdValue) -> ValueResult<()> {
        match value.compare(&self.value) {
            Some(ordering) if self.kind.accepts(ordering) => Ok(()),
            _ => Err(ValidationError::new(format!(
                "value '{}' must be {} {}",
                lexical,
                self.kind.relation(),
                self.literal
            ))
            .with_facet(self.kind.name())),
        }
    }
}

// =============================================================================
// Facet Sets
// =============================================================================

/// A facet as written in a restriction, before its base type is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSpec {
    /// Facet element local name
    pub name: String,
    /// `value` attribute
    pub value: String,
}

impl FacetSpec {
    /// Create a new raw facet
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Facet element names recognized inside a restriction
pub fn is_facet_name(name: &str) -> bool {
    matches!(
        name,
        XSD_LENGTH
            | XSD_MIN_LENGTH
            | XSD_MAX_LENGTH
            | XSD_PATTERN
            | XSD_ENUMERATION
            | XSD_WHITE_SPACE
            | XSD_MIN_INCLUSIVE
            | XSD_MAX_INCLUSIVE
            | XSD_MIN_EXCLUSIVE
            | XSD_MAX_EXCLUSIVE
            | XSD_TOTAL_DIGITS
            | XSD_FRACTION_DIGITS
    )
}

/// Compiled facets of one restriction step
#[derive(Debug, Clone, Default)]
pub struct Facets {
    /// whiteSpace
    pub white_space: Option<WhiteSpace>,
    /// length
    pub length: Option<usize>,
    /// minLength
    pub min_length: Option<usize>,
    /// maxLength
    pub max_length: Option<usize>,
    /// pattern (alternatives of this step)
    pub pattern: Option<PatternFacet>,
    /// enumeration
    pub enumeration: Option<EnumerationFacet>,
    /// range facets
    pub bounds: Vec<BoundFacet>,
    /// totalDigits
    pub total_digits: Option<u32>,
    /// fractionDigits
    pub fraction_digits: Option<u32>,
}

fn parse_count<T: FromStr>(spec: &FacetSpec) -> Result<T, CompileError> {
    spec.value.trim().parse().map_err(|_| {
        CompileError::invalid(format!(
            "facet '{}' requires a non-negative integer, found '{}'",
            spec.name, spec.value
        ))
    })
}

impl Facets {
    /// Compile raw facets against a base type.
    ///
    /// `primitive` decides which facets apply; `parse` turns a literal into
    /// a value of the base type for enumeration and range facets.
    pub fn compile<F>(specs: &[FacetSpec], primitive: Primitive, parse: F) -> Result<Self, CompileError>
    where
        F: Fn(&str) -> ValueResult<XsdValue>,
    {
        let mut facets = Facets::default();
        let mut patterns = Vec::new();
        let mut enumeration = Vec::new();

        for spec in specs {
            if !primitive.admits(&spec.name) {
                return Err(CompileError::invalid(format!(
                    "facet '{}' is not applicable to a {:?} type",
                    spec.name, primitive
                )));
            }
            match spec.name.as_str() {
                XSD_WHITE_SPACE => {
                    let mode = spec
                        .value
                        .parse::<WhiteSpace>()
                        .map_err(|e| CompileError::invalid(e.message))?;
                    facets.white_space = Some(mode);
                }
                XSD_LENGTH => facets.length = Some(parse_count(spec)?),
                XSD_MIN_LENGTH => facets.min_length = Some(parse_count(spec)?),
                XSD_MAX_LENGTH => facets.max_length = Some(parse_count(spec)?),
                XSD_TOTAL_DIGITS => {
                    let digits: u32 = parse_count(spec)?;
                    if digits == 0 {
                        return Err(CompileError::invalid("totalDigits must be positive"));
                    }
                    facets.total_digits = Some(digits);
                }
                XSD_FRACTION_DIGITS => facets.fraction_digits = Some(parse_count(spec)?),
                XSD_PATTERN => patterns.push(spec.value.clone()),
                XSD_ENUMERATION => {
                    let value = parse(&spec.value).map_err(|e| {
                        CompileError::invalid(format!(
                            "enumeration value '{}' is not valid for the base type: {}",
                            spec.value, e
                        ))
                    })?;
                    enumeration.push((spec.value.clone(), value));
                }
                name => {
                    let kind = BoundKind::from_facet(name).ok_or_else(|| {
                        CompileError::invalid(format!("unknown facet '{}'", name))
                    })?;
                    let value = parse(&spec.value).map_err(|e| {
                        CompileError::invalid(format!(
                            "{} value '{}' is not valid for the base type: {}",
                            name, spec.value, e
                        ))
                    })?;
                    facets.bounds.push(BoundFacet {
                        kind,
                        literal: spec.value.clone(),
                        value,
                    });
                }
            }
        }

        if !patterns.is_empty() {
            let pattern = PatternFacet::new(&patterns).map_err(|e| {
                CompileError::invalid(format!("invalid pattern '{}': {}", patterns.join("|"), e))
            })?;
            facets.pattern = Some(pattern);
        }
        if !enumeration.is_empty() {
            facets.enumeration = Some(EnumerationFacet {
                values: enumeration,
            });
        }
        facets.check_consistency()?;
        Ok(facets)
    }

    fn check_consistency(&self) -> Result<(), CompileError> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(CompileError::invalid(format!(
                    "minLength ({}) is greater than maxLength ({})",
                    min, max
                )));
            }
        }
        if let Some(length) = self.length {
            if self.min_length.map_or(false, |m| m > length)
                || self.max_length.map_or(false, |m| m < length)
            {
                return Err(CompileError::invalid(
                    "length conflicts with minLength or maxLength",
                ));
            }
        }
        if let (Some(total), Some(fraction)) = (self.total_digits, self.fraction_digits) {
            if fraction > total {
                return Err(CompileError::invalid(format!(
                    "fractionDigits ({}) is greater than totalDigits ({})",
                    fraction, total
                )));
            }
        }
        Ok(())
    }

    /// Check whether no facet is set
    pub fn is_empty(&self) -> bool {
        self.white_space.is_none()
            && self.length.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.enumeration.is_none()
            && self.bounds.is_empty()
            && self.total_digits.is_none()
            && self.fraction_digits.is_none()
    }

    /// Validate a normalized lexical form and its typed value
    pub fn validate(&self, lexical: &str, value: &XsdValue) -> ValueResult<()> {
        let length = value.length(lexical);
        if let Some(expected) = self.length {
            if length != expected {
                return Err(ValidationError::new(format!(
                    "length of '{}' must be exactly {}",
                    lexical, expected
                ))
                .with_facet(XSD_LENGTH)
                .with_reason(format!("actual length is {}", length)));
            }
        }
        if let Some(min) = self.min_length {
            if length < min {
                return Err(ValidationError::new(format!(
                    "length of '{}' must be at least {}",
                    lexical, min
                ))
                .with_facet(XSD_MIN_LENGTH)
                .with_reason(format!("actual length is {}", length)));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(ValidationError::new(format!(
                    "length of '{}' must be at most {}",
                    lexical, max
                ))
                .with_facet(XSD_MAX_LENGTH)
                .with_reason(format!("actual length is {}", length)));
            }
        }
        if let Some(pattern) = &self.pattern {
            pattern.validate(lexical)?;
        }
        if let Some(enumeration) = &self.enumeration {
            enumeration.validate(lexical, value)?;
        }
        for bound in &self.bounds {
            bound.validate(lexical, value)?;
        }
        if self.total_digits.is_some() || self.fraction_digits.is_some() {
            if let Some((total, fraction)) = value.digits() {
                if let Some(max) = self.total_digits {
                    if total > max {
                        return Err(ValidationError::new(format!(
                            "value '{}' has more than {} total digits",
                            lexical, max
                        ))
                        .with_facet(XSD_TOTAL_DIGITS));
                    }
                }
                if let Some(max) = self.fraction_digits {
                    if fraction > max {
                        return Err(ValidationError::new(format!(
                            "value '{}' has more than {} fraction digits",
                            lexical, max
                        ))
                        .with_facet(XSD_FRACTION_DIGITS));
                    }
                }
            }
        }
        Ok(())
    }
}
