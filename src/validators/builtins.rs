//! XSD built-in types
//!
//! This module defines the built-in primitive and derived datatypes of XML
//! Schema. Every compiled grammar pre-registers them under the XSD namespace.

use crate::error::{ValidationError, ValueResult};
use crate::names::{is_valid_name, is_valid_ncname, is_valid_nmtoken, is_valid_qname};
use crate::validators::facets::WhiteSpace;
use crate::validators::helpers::{
    base64_binary_validator, boolean_validator, date_validator, datetime_validator,
    decimal_validator, duration_validator, float_validator, gregorian_validator,
    hex_binary_validator, integer_validator, language_validator, time_validator,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

// Type names - String types
/// XSD string type name
pub const XSD_STRING: &str = "string";
/// XSD normalizedString type name
pub const XSD_NORMALIZED_STRING: &str = "normalizedString";
/// XSD token type name
pub const XSD_TOKEN: &str = "token";
/// XSD language type name
pub const XSD_LANGUAGE: &str = "language";
/// XSD Name type name
pub const XSD_NAME: &str = "Name";
/// XSD NCName type name
pub const XSD_NCNAME: &str = "NCName";
/// XSD ID type name
pub const XSD_ID: &str = "ID";
/// XSD IDREF type name
pub const XSD_IDREF: &str = "IDREF";
/// XSD IDREFS type name
pub const XSD_IDREFS: &str = "IDREFS";
/// XSD ENTITY type name
pub const XSD_ENTITY: &str = "ENTITY";
/// XSD ENTITIES type name
pub const XSD_ENTITIES: &str = "ENTITIES";
/// XSD NMTOKEN type name
pub const XSD_NMTOKEN: &str = "NMTOKEN";
/// XSD NMTOKENS type name
pub const XSD_NMTOKENS: &str = "NMTOKENS";

/// XSD boolean type name
pub const XSD_BOOLEAN: &str = "boolean";

// Numeric types
/// XSD decimal type name
pub const XSD_DECIMAL: &str = "decimal";
/// XSD integer type name
pub const XSD_INTEGER: &str = "integer";
/// XSD long type name
pub const XSD_LONG: &str = "long";
/// XSD int type name
pub const XSD_INT: &str = "int";
/// XSD short type name
pub const XSD_SHORT: &str = "short";
/// XSD byte type name
pub const XSD_BYTE: &str = "byte";
/// XSD nonNegativeInteger type name
pub const XSD_NON_NEGATIVE_INTEGER: &str = "nonNegativeInteger";
/// XSD positiveInteger type name
pub const XSD_POSITIVE_INTEGER: &str = "positiveInteger";
/// XSD unsignedLong type name
pub const XSD_UNSIGNED_LONG: &str = "unsignedLong";
/// XSD unsignedInt type name
pub const XSD_UNSIGNED_INT: &str = "unsignedInt";
/// XSD unsignedShort type name
pub const XSD_UNSIGNED_SHORT: &str = "unsignedShort";
/// XSD unsignedByte type name
pub const XSD_UNSIGNED_BYTE: &str = "unsignedByte";
/// XSD nonPositiveInteger type name
pub const XSD_NON_POSITIVE_INTEGER: &str = "nonPositiveInteger";
/// XSD negativeInteger type name
pub const XSD_NEGATIVE_INTEGER: &str = "negativeInteger";

/// XSD float type name
pub const XSD_FLOAT: &str = "float";
/// XSD double type name
pub const XSD_DOUBLE: &str = "double";

// Date/time types
/// XSD duration type name
pub const XSD_DURATION: &str = "duration";
/// XSD dateTime type name
pub const XSD_DATETIME: &str = "dateTime";
/// XSD time type name
pub const XSD_TIME: &str = "time";
/// XSD date type name
pub const XSD_DATE: &str = "date";
/// XSD gYearMonth type name
pub const XSD_GYEAR_MONTH: &str = "gYearMonth";
/// XSD gYear type name
pub const XSD_GYEAR: &str = "gYear";
/// XSD gMonthDay type name
pub const XSD_GMONTH_DAY: &str = "gMonthDay";
/// XSD gDay type name
pub const XSD_GDAY: &str = "gDay";
/// XSD gMonth type name
pub const XSD_GMONTH: &str = "gMonth";

// Binary types
/// XSD hexBinary type name
pub const XSD_HEX_BINARY: &str = "hexBinary";
/// XSD base64Binary type name
pub const XSD_BASE64_BINARY: &str = "base64Binary";

// Other types
/// XSD anyURI type name
pub const XSD_ANY_URI: &str = "anyURI";
/// XSD QName type name
pub const XSD_QNAME: &str = "QName";
/// XSD NOTATION type name
pub const XSD_NOTATION: &str = "NOTATION";

// Special types
/// XSD anyType name
pub const XSD_ANY_TYPE: &str = "anyType";
/// XSD anySimpleType name
pub const XSD_ANY_SIMPLE_TYPE: &str = "anySimpleType";

// Facet names
/// XSD length facet
pub const XSD_LENGTH: &str = "length";
/// XSD minLength facet
pub const XSD_MIN_LENGTH: &str = "minLength";
/// XSD maxLength facet
pub const XSD_MAX_LENGTH: &str = "maxLength";
/// XSD pattern facet
pub const XSD_PATTERN: &str = "pattern";
/// XSD enumeration facet
pub const XSD_ENUMERATION: &str = "enumeration";
/// XSD whiteSpace facet
pub const XSD_WHITE_SPACE: &str = "whiteSpace";
/// XSD maxInclusive facet
pub const XSD_MAX_INCLUSIVE: &str = "maxInclusive";
/// XSD maxExclusive facet
pub const XSD_MAX_EXCLUSIVE: &str = "maxExclusive";
/// XSD minInclusive facet
pub const XSD_MIN_INCLUSIVE: &str = "minInclusive";
/// XSD minExclusive facet
pub const XSD_MIN_EXCLUSIVE: &str = "minExclusive";
/// XSD totalDigits facet
pub const XSD_TOTAL_DIGITS: &str = "totalDigits";
/// XSD fractionDigits facet
pub const XSD_FRACTION_DIGITS: &str = "fractionDigits";

// =============================================================================
// XSD Value Representation
// =============================================================================

/// Typed value of a validated lexical form
#[derive(Debug, Clone, PartialEq)]
pub enum XsdValue {
    /// String value (all string-derived types)
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Decimal value
    Decimal(Decimal),
    /// Integer value (integer-derived types)
    Integer(i128),
    /// Float value
    Float(f64),
    /// Double value
    Double(f64),
    /// Binary value (hex or base64 decoded)
    Binary(Vec<u8>),
    /// Duration value, kept lexical
    Duration(String),
    /// DateTime value, normalized to UTC when zoned
    DateTime(NaiveDateTime),
    /// Date value
    Date(NaiveDate),
    /// Time value, normalized to UTC when zoned
    Time(NaiveTime),
    /// gYear value
    GYear(i64),
    /// Other Gregorian fragments, kept lexical
    Gregorian(String),
    /// URI value
    Uri(String),
    /// QName or NOTATION lexical value
    QName(String),
    /// Items of a list type
    List(Vec<XsdValue>),
}

impl XsdValue {
    /// Compare two values of an ordered datatype
    pub fn compare(&self, other: &XsdValue) -> Option<Ordering> {
        use XsdValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
            (Integer(_), Decimal(_)) | (Decimal(_), Integer(_)) => {
                Some(self.as_decimal()?.cmp(&other.as_decimal()?))
            }
            (Float(a) | Double(a), Float(b) | Double(b)) => a.partial_cmp(b),
            (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Time(a), Time(b)) => Some(a.cmp(b)),
            (GYear(a), GYear(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            XsdValue::Decimal(d) => Some(*d),
            XsdValue::Integer(i) => Decimal::try_from_i128_with_scale(*i, 0).ok(),
            _ => None,
        }
    }

    /// Length in the units the length facets count: characters for
    /// strings, octets for binary values, items for lists
    pub fn length(&self, lexical: &str) -> usize {
        match self {
            XsdValue::Binary(bytes) => bytes.len(),
            XsdValue::List(items) => items.len(),
            _ => lexical.chars().count(),
        }
    }

    /// Total and fraction digit counts of a decimal value
    pub fn digits(&self) -> Option<(u32, u32)> {
        let decimal = self.as_decimal()?.normalize();
        let fraction = decimal.scale();
        let mantissa = decimal.mantissa().unsigned_abs();
        let integer_digits = if mantissa == 0 {
            1
        } else {
            mantissa.to_string().len() as u32
        };
        Some((integer_digits.max(fraction), fraction))
    }
}

impl fmt::Display for XsdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XsdValue::String(s)
            | XsdValue::Duration(s)
            | XsdValue::Gregorian(s)
            | XsdValue::Uri(s)
            | XsdValue::QName(s) => write!(f, "{}", s),
            XsdValue::Boolean(b) => write!(f, "{}", b),
            XsdValue::Decimal(d) => write!(f, "{}", d),
            XsdValue::Integer(i) => write!(f, "{}", i),
            XsdValue::Float(v) | XsdValue::Double(v) => {
                if v.is_nan() {
                    write!(f, "NaN")
                } else if *v == f64::INFINITY {
                    write!(f, "INF")
                } else if *v == f64::NEG_INFINITY {
                    write!(f, "-INF")
                } else {
                    write!(f, "{}", v)
                }
            }
            XsdValue::Binary(bytes) => {
                for byte in bytes {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
            XsdValue::DateTime(dt) => write!(f, "{}", dt),
            XsdValue::Date(d) => write!(f, "{}", d),
            XsdValue::Time(t) => write!(f, "{}", t),
            XsdValue::GYear(y) => write!(f, "{}", y),
            XsdValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

// =============================================================================
// Built-in Type Definition
// =============================================================================

/// Primitive datatype a built-in ultimately derives from.
///
/// Decides which constraining facets a restriction may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// anySimpleType itself
    AnySimple,
    /// string and its derivatives
    String,
    /// boolean
    Boolean,
    /// decimal and the integer family
    Decimal,
    /// float
    Float,
    /// double
    Double,
    /// duration
    Duration,
    /// dateTime
    DateTime,
    /// time
    Time,
    /// date
    Date,
    /// gYear
    GYear,
    /// gYearMonth, gMonthDay, gDay, gMonth
    Gregorian,
    /// hexBinary and base64Binary
    Binary,
    /// anyURI
    AnyUri,
    /// QName and NOTATION
    QName,
    /// built-in list types (IDREFS, ENTITIES, NMTOKENS)
    List,
}

impl Primitive {
    /// Check whether a constraining facet applies to this primitive
    pub fn admits(&self, facet: &str) -> bool {
        match facet {
            XSD_PATTERN | XSD_WHITE_SPACE => true,
            XSD_ENUMERATION => !matches!(self, Primitive::Boolean),
            XSD_LENGTH | XSD_MIN_LENGTH | XSD_MAX_LENGTH => matches!(
                self,
                Primitive::AnySimple
                    | Primitive::String
                    | Primitive::Binary
                    | Primitive::AnyUri
                    | Primitive::QName
                    | Primitive::List
            ),
            XSD_MIN_INCLUSIVE | XSD_MAX_INCLUSIVE | XSD_MIN_EXCLUSIVE | XSD_MAX_EXCLUSIVE => {
                self.is_ordered()
            }
            XSD_TOTAL_DIGITS | XSD_FRACTION_DIGITS => matches!(self, Primitive::Decimal),
            _ => false,
        }
    }

    /// Ordered primitives whose values support range facets
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            Primitive::Decimal
                | Primitive::Float
                | Primitive::Double
                | Primitive::DateTime
                | Primitive::Time
                | Primitive::Date
                | Primitive::GYear
        )
    }
}

/// Definition of a built-in XSD type
#[derive(Debug, Clone)]
pub struct BuiltinType {
    /// Type name (local name without namespace)
    pub name: &'static str,
    /// Primitive ancestor
    pub primitive: Primitive,
    /// Base type name (`None` for anySimpleType)
    pub base_type: Option<&'static str>,
    /// White space handling
    pub white_space: WhiteSpace,
    /// Validator function
    validator: fn(&str) -> ValueResult<XsdValue>,
}

impl BuiltinType {
    /// Validate a string value against this type
    pub fn validate(&self, value: &str) -> ValueResult<XsdValue> {
        let normalized = self.white_space.normalize(value);
        (self.validator)(&normalized)
    }
}

const fn builtin(
    name: &'static str,
    primitive: Primitive,
    base_type: &'static str,
    white_space: WhiteSpace,
    validator: fn(&str) -> ValueResult<XsdValue>,
) -> BuiltinType {
    BuiltinType {
        name,
        primitive,
        base_type: Some(base_type),
        white_space,
        validator,
    }
}

use WhiteSpace::{Collapse, Preserve, Replace};

/// All built-in simple types, primitives before their derivatives
pub static BUILTIN_TYPES: &[BuiltinType] = &[
    BuiltinType {
        name: XSD_ANY_SIMPLE_TYPE,
        primitive: Primitive::AnySimple,
        base_type: None,
        white_space: Preserve,
        validator: validate_string,
    },
    builtin(XSD_STRING, Primitive::String, XSD_ANY_SIMPLE_TYPE, Preserve, validate_string),
    builtin(XSD_NORMALIZED_STRING, Primitive::String, XSD_STRING, Replace, validate_string),
    builtin(XSD_TOKEN, Primitive::String, XSD_NORMALIZED_STRING, Collapse, validate_string),
    builtin(XSD_LANGUAGE, Primitive::String, XSD_TOKEN, Collapse, validate_language),
    builtin(XSD_NAME, Primitive::String, XSD_TOKEN, Collapse, validate_name),
    builtin(XSD_NCNAME, Primitive::String, XSD_NAME, Collapse, validate_ncname),
    builtin(XSD_ID, Primitive::String, XSD_NCNAME, Collapse, validate_ncname),
    builtin(XSD_IDREF, Primitive::String, XSD_NCNAME, Collapse, validate_ncname),
    builtin(XSD_ENTITY, Primitive::String, XSD_NCNAME, Collapse, validate_ncname),
    builtin(XSD_NMTOKEN, Primitive::String, XSD_TOKEN, Collapse, validate_nmtoken),
    builtin(XSD_IDREFS, Primitive::List, XSD_ANY_SIMPLE_TYPE, Collapse, validate_ncname_list),
    builtin(XSD_ENTITIES, Primitive::List, XSD_ANY_SIMPLE_TYPE, Collapse, validate_ncname_list),
    builtin(XSD_NMTOKENS, Primitive::List, XSD_ANY_SIMPLE_TYPE, Collapse, validate_nmtoken_list),
    builtin(XSD_BOOLEAN, Primitive::Boolean, XSD_ANY_SIMPLE_TYPE, Collapse, validate_boolean),
    builtin(XSD_DECIMAL, Primitive::Decimal, XSD_ANY_SIMPLE_TYPE, Collapse, validate_decimal),
    builtin(XSD_INTEGER, Primitive::Decimal, XSD_DECIMAL, Collapse, validate_integer),
    builtin(XSD_LONG, Primitive::Decimal, XSD_INTEGER, Collapse, validate_long),
    builtin(XSD_INT, Primitive::Decimal, XSD_LONG, Collapse, validate_int),
    builtin(XSD_SHORT, Primitive::Decimal, XSD_INT, Collapse, validate_short),
    builtin(XSD_BYTE, Primitive::Decimal, XSD_SHORT, Collapse, validate_byte),
    builtin(XSD_NON_NEGATIVE_INTEGER, Primitive::Decimal, XSD_INTEGER, Collapse, validate_non_negative),
    builtin(XSD_POSITIVE_INTEGER, Primitive::Decimal, XSD_NON_NEGATIVE_INTEGER, Collapse, validate_positive),
    builtin(XSD_UNSIGNED_LONG, Primitive::Decimal, XSD_NON_NEGATIVE_INTEGER, Collapse, validate_unsigned_long),
    builtin(XSD_UNSIGNED_INT, Primitive::Decimal, XSD_UNSIGNED_LONG, Collapse, validate_unsigned_int),
    builtin(XSD_UNSIGNED_SHORT, Primitive::Decimal, XSD_UNSIGNED_INT, Collapse, validate_unsigned_short),
    builtin(XSD_UNSIGNED_BYTE, Primitive::Decimal, XSD_UNSIGNED_SHORT, Collapse, validate_unsigned_byte),
    builtin(XSD_NON_POSITIVE_INTEGER, Primitive::Decimal, XSD_INTEGER, Collapse, validate_non_positive),
    builtin(XSD_NEGATIVE_INTEGER, Primitive::Decimal, XSD_NON_POSITIVE_INTEGER, Collapse, validate_negative),
    builtin(XSD_FLOAT, Primitive::Float, XSD_ANY_SIMPLE_TYPE, Collapse, validate_float),
    builtin(XSD_DOUBLE, Primitive::Double, XSD_ANY_SIMPLE_TYPE, Collapse, validate_double),
    builtin(XSD_DURATION, Primitive::Duration, XSD_ANY_SIMPLE_TYPE, Collapse, validate_duration),
    builtin(XSD_DATETIME, Primitive::DateTime, XSD_ANY_SIMPLE_TYPE, Collapse, validate_datetime),
    builtin(XSD_TIME, Primitive::Time, XSD_ANY_SIMPLE_TYPE, Collapse, validate_time),
    builtin(XSD_DATE, Primitive::Date, XSD_ANY_SIMPLE_TYPE, Collapse, validate_date),
    builtin(XSD_GYEAR, Primitive::GYear, XSD_ANY_SIMPLE_TYPE, Collapse, validate_gyear),
    builtin(XSD_GYEAR_MONTH, Primitive::Gregorian, XSD_ANY_SIMPLE_TYPE, Collapse, validate_gyear_month),
    builtin(XSD_GMONTH_DAY, Primitive::Gregorian, XSD_ANY_SIMPLE_TYPE, Collapse, validate_gmonth_day),
    builtin(XSD_GDAY, Primitive::Gregorian, XSD_ANY_SIMPLE_TYPE, Collapse, validate_gday),
    builtin(XSD_GMONTH, Primitive::Gregorian, XSD_ANY_SIMPLE_TYPE, Collapse, validate_gmonth),
    builtin(XSD_HEX_BINARY, Primitive::Binary, XSD_ANY_SIMPLE_TYPE, Collapse, validate_hex_binary),
    builtin(XSD_BASE64_BINARY, Primitive::Binary, XSD_ANY_SIMPLE_TYPE, Collapse, validate_base64_binary),
    builtin(XSD_ANY_URI, Primitive::AnyUri, XSD_ANY_SIMPLE_TYPE, Collapse, validate_any_uri),
    builtin(XSD_QNAME, Primitive::QName, XSD_ANY_SIMPLE_TYPE, Collapse, validate_qname),
    builtin(XSD_NOTATION, Primitive::QName, XSD_ANY_SIMPLE_TYPE, Collapse, validate_qname),
];

/// Look up a built-in simple type by local name
pub fn get_builtin_type(name: &str) -> Option<&'static BuiltinType> {
    BUILTIN_TYPES.iter().find(|t| t.name == name)
}

// =============================================================================
// Validator Functions
// =============================================================================

fn invalid(value: &str, type_name: &str) -> ValidationError {
    ValidationError::new(format!("'{}' is not a valid value of type '{}'", value, type_name))
}

fn validate_string(value: &str) -> ValueResult<XsdValue> {
    Ok(XsdValue::String(value.to_string()))
}

fn validate_language(value: &str) -> ValueResult<XsdValue> {
    language_validator(value)?;
    Ok(XsdValue::String(value.to_string()))
}

fn validate_name(value: &str) -> ValueResult<XsdValue> {
    if !is_valid_name(value) {
        return Err(invalid(value, XSD_NAME));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_ncname(value: &str) -> ValueResult<XsdValue> {
    if !is_valid_ncname(value) {
        return Err(invalid(value, XSD_NCNAME));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_nmtoken(value: &str) -> ValueResult<XsdValue> {
    if !is_valid_nmtoken(value) {
        return Err(invalid(value, XSD_NMTOKEN));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_token_list(
    value: &str,
    item: fn(&str) -> ValueResult<XsdValue>,
) -> ValueResult<XsdValue> {
    let items = value
        .split_whitespace()
        .map(item)
        .collect::<ValueResult<Vec<_>>>()?;
    if items.is_empty() {
        return Err(ValidationError::new("list value must contain at least one item"));
    }
    Ok(XsdValue::List(items))
}

fn validate_ncname_list(value: &str) -> ValueResult<XsdValue> {
    validate_token_list(value, validate_ncname)
}

fn validate_nmtoken_list(value: &str) -> ValueResult<XsdValue> {
    validate_token_list(value, validate_nmtoken)
}

fn validate_boolean(value: &str) -> ValueResult<XsdValue> {
    boolean_validator(value).map(XsdValue::Boolean)
}

fn validate_decimal(value: &str) -> ValueResult<XsdValue> {
    decimal_validator(value).map(XsdValue::Decimal)
}

fn integer_in(
    value: &str,
    type_name: &str,
    min: Option<i128>,
    max: Option<i128>,
) -> ValueResult<XsdValue> {
    integer_validator(value, type_name, min, max).map(XsdValue::Integer)
}

fn validate_integer(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_INTEGER, None, None)
}

fn validate_long(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_LONG, Some(i64::MIN.into()), Some(i64::MAX.into()))
}

fn validate_int(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_INT, Some(i32::MIN.into()), Some(i32::MAX.into()))
}

fn validate_short(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_SHORT, Some(i16::MIN.into()), Some(i16::MAX.into()))
}

fn validate_byte(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_BYTE, Some(i8::MIN.into()), Some(i8::MAX.into()))
}

fn validate_non_negative(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_NON_NEGATIVE_INTEGER, Some(0), None)
}

fn validate_positive(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_POSITIVE_INTEGER, Some(1), None)
}

fn validate_unsigned_long(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_UNSIGNED_LONG, Some(0), Some(u64::MAX.into()))
}

fn validate_unsigned_int(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_UNSIGNED_INT, Some(0), Some(u32::MAX.into()))
}

fn validate_unsigned_short(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_UNSIGNED_SHORT, Some(0), Some(u16::MAX.into()))
}

fn validate_unsigned_byte(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_UNSIGNED_BYTE, Some(0), Some(u8::MAX.into()))
}

fn validate_non_positive(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_NON_POSITIVE_INTEGER, None, Some(0))
}

fn validate_negative(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, XSD_NEGATIVE_INTEGER, None, Some(-1))
}

fn validate_float(value: &str) -> ValueResult<XsdValue> {
    float_validator(value, XSD_FLOAT).map(XsdValue::Float)
}

fn validate_double(value: &str) -> ValueResult<XsdValue> {
    float_validator(value, XSD_DOUBLE).map(XsdValue::Double)
}

fn validate_duration(value: &str) -> ValueResult<XsdValue> {
    duration_validator(value)?;
    Ok(XsdValue::Duration(value.to_string()))
}

fn validate_datetime(value: &str) -> ValueResult<XsdValue> {
    datetime_validator(value).map(XsdValue::DateTime)
}

fn validate_time(value: &str) -> ValueResult<XsdValue> {
    time_validator(value).map(XsdValue::Time)
}

fn validate_date(value: &str) -> ValueResult<XsdValue> {
    date_validator(value).map(|(date, _)| XsdValue::Date(date))
}

fn validate_gyear(value: &str) -> ValueResult<XsdValue> {
    gregorian_validator(value, XSD_GYEAR).map(XsdValue::GYear)
}

fn gregorian(value: &str, type_name: &str) -> ValueResult<XsdValue> {
    gregorian_validator(value, type_name)?;
    Ok(XsdValue::Gregorian(value.to_string()))
}

fn validate_gyear_month(value: &str) -> ValueResult<XsdValue> {
    gregorian(value, XSD_GYEAR_MONTH)
}

fn validate_gmonth_day(value: &str) -> ValueResult<XsdValue> {
    gregorian(value, XSD_GMONTH_DAY)
}

fn validate_gday(value: &str) -> ValueResult<XsdValue> {
    gregorian(value, XSD_GDAY)
}

fn validate_gmonth(value: &str) -> ValueResult<XsdValue> {
    gregorian(value, XSD_GMONTH)
}

fn validate_hex_binary(value: &str) -> ValueResult<XsdValue> {
    hex_binary_validator(value).map(XsdValue::Binary)
}

fn validate_base64_binary(value: &str) -> ValueResult<XsdValue> {
    base64_binary_validator(value).map(XsdValue::Binary)
}

fn validate_any_uri(value: &str) -> ValueResult<XsdValue> {
    if value.chars().any(|c| c.is_control()) {
        return Err(invalid(value, XSD_ANY_URI));
    }
    Ok(XsdValue::Uri(value.to_string()))
}

fn validate_qname(value: &str) -> ValueResult<XsdValue> {
    if !is_valid_qname(value) {
        return Err(invalid(value, XSD_QNAME));
    }
    Ok(XsdValue::QName(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup() {
        assert!(get_builtin_type("string").is_some());
        assert!(get_builtin_type("unsignedByte").is_some());
        assert!(get_builtin_type("anyType").is_none());
        assert!(get_builtin_type("nope").is_none());
    }

    #[test]
    fn test_every_base_is_registered() {
        for t in BUILTIN_TYPES {
            if let Some(base) = t.base_type {
                assert!(get_builtin_type(base).is_some(), "{} has unknown base {}", t.name, base);
            }
        }
    }

    #[test]
    fn test_whitespace_applied_before_validation() {
        let int = get_builtin_type(XSD_INT).unwrap();
        assert_eq!(int.validate("  42 ").unwrap(), XsdValue::Integer(42));
        assert!(int.validate("4 2").is_err());

        let token = get_builtin_type(XSD_TOKEN).unwrap();
        assert_eq!(
            token.validate(" a \t b ").unwrap(),
            XsdValue::String("a b".to_string())
        );
    }

    #[test]
    fn test_integer_ranges() {
        let byte = get_builtin_type(XSD_BYTE).unwrap();
        assert!(byte.validate("127").is_ok());
        assert!(byte.validate("128").is_err());
        let ulong = get_builtin_type(XSD_UNSIGNED_LONG).unwrap();
        assert!(ulong.validate("18446744073709551615").is_ok());
        assert!(ulong.validate("-1").is_err());
    }

    #[test]
    fn test_builtin_lists() {
        let idrefs = get_builtin_type(XSD_IDREFS).unwrap();
        let value = idrefs.validate("a b  c").unwrap();
        assert_eq!(value.length("a b c"), 3);
        assert!(idrefs.validate("").is_err());
        assert!(idrefs.validate("1a").is_err());
    }

    #[test]
    fn test_value_compare() {
        let a = XsdValue::Integer(5);
        let b = XsdValue::Decimal(Decimal::new(55, 1));
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(
            XsdValue::Float(f64::NAN).compare(&XsdValue::Float(1.0)),
            None
        );
        assert_eq!(XsdValue::Boolean(true).compare(&XsdValue::Boolean(false)), None);
    }

    #[test]
    fn test_digits() {
        assert_eq!(XsdValue::Decimal(Decimal::new(12345, 2)).digits(), Some((5, 2)));
        assert_eq!(XsdValue::Decimal(Decimal::new(1200, 2)).digits(), Some((2, 0)));
        assert_eq!(XsdValue::Integer(0).digits(), Some((1, 0)));
        assert_eq!(XsdValue::Decimal(Decimal::new(5, 3)).digits(), Some((3, 3)));
    }

    #[test]
    fn test_admitted_facets() {
        assert!(Primitive::String.admits(XSD_MAX_LENGTH));
        assert!(!Primitive::String.admits(XSD_MAX_INCLUSIVE));
        assert!(Primitive::Decimal.admits(XSD_TOTAL_DIGITS));
        assert!(!Primitive::Float.admits(XSD_TOTAL_DIGITS));
        assert!(Primitive::Date.admits(XSD_MIN_EXCLUSIVE));
        assert!(!Primitive::Boolean.admits(XSD_ENUMERATION));
    }
}
