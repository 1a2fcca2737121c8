//! Validator helper functions
//!
//! Lexical-space checks for the primitive datatypes. Each function takes an
//! already whitespace-normalized string and returns the typed value or a
//! [`ValidationError`] naming the datatype.

use crate::error::{ValidationError, ValueResult};
use base64::Engine;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("static regex"));

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("static regex"));

static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(\d+(\.\d*)?|\.\d+)([Ee][+-]?\d+)?|[+-]?INF|NaN)$").expect("static regex")
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?\d{4,})-(\d{2})-(\d{2})(Z|[+-]\d{2}:\d{2})?$").expect("static regex")
});

static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?\d{4,})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
        .expect("static regex")
});

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").expect("static regex")
});

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$").expect("static regex")
});

static LANGUAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").expect("static regex"));

fn invalid(value: &str, type_name: &str) -> ValidationError {
    ValidationError::new(format!("'{}' is not a valid value of type '{}'", value, type_name))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parse an xs:decimal lexical value
pub fn decimal_validator(value: &str) -> ValueResult<Decimal> {
    if !DECIMAL_RE.is_match(value) {
        return Err(invalid(value, "decimal"));
    }
    let normalized = value.strip_prefix('+').unwrap_or(value);
    let normalized = if normalized.ends_with('.') {
        &normalized[..normalized.len() - 1]
    } else {
        normalized
    };
    Decimal::from_str(normalized).map_err(|e| invalid(value, "decimal").with_reason(e.to_string()))
}

/// Parse an xs:integer lexical value and check it against an inclusive range
pub fn integer_validator(
    value: &str,
    type_name: &str,
    min: Option<i128>,
    max: Option<i128>,
) -> ValueResult<i128> {
    if !INTEGER_RE.is_match(value) {
        return Err(invalid(value, type_name));
    }
    let parsed: i128 = value
        .parse()
        .map_err(|_| invalid(value, type_name).with_reason("out of range"))?;

    if let Some(min) = min {
        if parsed < min {
            return Err(invalid(value, type_name).with_reason(format!("value must be >= {}", min)));
        }
    }
    if let Some(max) = max {
        if parsed > max {
            return Err(invalid(value, type_name).with_reason(format!("value must be <= {}", max)));
        }
    }
    Ok(parsed)
}

/// Parse an xs:float or xs:double lexical value
pub fn float_validator(value: &str, type_name: &str) -> ValueResult<f64> {
    if !FLOAT_RE.is_match(value) {
        return Err(invalid(value, type_name));
    }
    match value {
        "INF" | "+INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => value.parse::<f64>().map_err(|_| invalid(value, type_name)),
    }
}

/// Parse an xs:boolean lexical value
pub fn boolean_validator(value: &str) -> ValueResult<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(value, "boolean")),
    }
}

// =============================================================================
// Binary Validators
// =============================================================================

/// Decode an xs:hexBinary value
pub fn hex_binary_validator(value: &str) -> ValueResult<Vec<u8>> {
    if value.len() % 2 != 0 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(value, "hexBinary"));
    }
    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&value[i..i + 2], 16).map_err(|_| invalid(value, "hexBinary")))
        .collect()
}

/// Decode an xs:base64Binary value (internal whitespace is allowed)
pub fn base64_binary_validator(value: &str) -> ValueResult<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| invalid(value, "base64Binary").with_reason(e.to_string()))
}

// =============================================================================
// Date and Time Validators
// =============================================================================

/// Timezone offset in minutes, if one is present
fn parse_timezone(tz: Option<&str>, value: &str, type_name: &str) -> ValueResult<Option<i32>> {
    let tz = match tz {
        None => return Ok(None),
        Some("Z") => return Ok(Some(0)),
        Some(tz) => tz,
    };
    let sign = if tz.starts_with('-') { -1 } else { 1 };
    let hours: i32 = tz[1..3].parse().map_err(|_| invalid(value, type_name))?;
    let minutes: i32 = tz[4..6].parse().map_err(|_| invalid(value, type_name))?;
    if hours > 14 || minutes > 59 || (hours == 14 && minutes != 0) {
        return Err(invalid(value, type_name).with_reason("timezone out of range"));
    }
    Ok(Some(sign * (hours * 60 + minutes)))
}

fn parse_date_parts(year: &str, month: &str, day: &str, value: &str, type_name: &str) -> ValueResult<NaiveDate> {
    let year: i32 = year.parse().map_err(|_| invalid(value, type_name))?;
    let month: u32 = month.parse().map_err(|_| invalid(value, type_name))?;
    let day: u32 = day.parse().map_err(|_| invalid(value, type_name))?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| invalid(value, type_name).with_reason("no such calendar date"))
}

fn parse_time_parts(
    hour: &str,
    minute: &str,
    second: &str,
    fraction: Option<&str>,
    value: &str,
    type_name: &str,
) -> ValueResult<(NaiveTime, bool)> {
    let hour: u32 = hour.parse().map_err(|_| invalid(value, type_name))?;
    let minute: u32 = minute.parse().map_err(|_| invalid(value, type_name))?;
    let second: u32 = second.parse().map_err(|_| invalid(value, type_name))?;
    let nanos = match fraction {
        Some(f) => {
            let digits: String = f[1..].chars().chain(std::iter::repeat('0')).take(9).collect();
            digits.parse::<u32>().map_err(|_| invalid(value, type_name))?
        }
        None => 0,
    };

    // 24:00:00 is the end of the day and the start of the next one
    if hour == 24 {
        if minute == 0 && second == 0 && nanos == 0 {
            return Ok((NaiveTime::MIN, true));
        }
        return Err(invalid(value, type_name).with_reason("hour 24 is only allowed as 24:00:00"));
    }
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .map(|t| (t, false))
        .ok_or_else(|| invalid(value, type_name).with_reason("time out of range"))
}

fn to_utc(
    naive: NaiveDateTime,
    offset_minutes: Option<i32>,
    value: &str,
    type_name: &str,
) -> ValueResult<NaiveDateTime> {
    match offset_minutes {
        Some(offset) => naive
            .checked_sub_signed(Duration::minutes(i64::from(offset)))
            .ok_or_else(|| invalid(value, type_name).with_reason("out of range")),
        None => Ok(naive),
    }
}

/// Parse an xs:date value, returning the date and its timezone offset
pub fn date_validator(value: &str) -> ValueResult<(NaiveDate, Option<i32>)> {
    let caps = DATE_RE.captures(value).ok_or_else(|| invalid(value, "date"))?;
    let date = parse_date_parts(&caps[1], &caps[2], &caps[3], value, "date")?;
    let tz = parse_timezone(caps.get(4).map(|m| m.as_str()), value, "date")?;
    Ok((date, tz))
}

/// Parse an xs:dateTime value, normalized to UTC when a timezone is present
pub fn datetime_validator(value: &str) -> ValueResult<NaiveDateTime> {
    let caps = DATETIME_RE.captures(value).ok_or_else(|| invalid(value, "dateTime"))?;
    let date = parse_date_parts(&caps[1], &caps[2], &caps[3], value, "dateTime")?;
    let (time, next_day) = parse_time_parts(
        &caps[4],
        &caps[5],
        &caps[6],
        caps.get(7).map(|m| m.as_str()),
        value,
        "dateTime",
    )?;
    let tz = parse_timezone(caps.get(8).map(|m| m.as_str()), value, "dateTime")?;
    let mut naive = NaiveDateTime::new(date, time);
    if next_day {
        naive = naive
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| invalid(value, "dateTime").with_reason("out of range"))?;
    }
    to_utc(naive, tz, value, "dateTime")
}

/// Parse an xs:time value, normalized to UTC when a timezone is present
pub fn time_validator(value: &str) -> ValueResult<NaiveTime> {
    let caps = TIME_RE.captures(value).ok_or_else(|| invalid(value, "time"))?;
    let (time, _) = parse_time_parts(
        &caps[1],
        &caps[2],
        &caps[3],
        caps.get(4).map(|m| m.as_str()),
        value,
        "time",
    )?;
    let tz = parse_timezone(caps.get(5).map(|m| m.as_str()), value, "time")?;
    Ok(match tz {
        Some(offset) => time - Duration::minutes(i64::from(offset)),
        None => time,
    })
}

/// Check an xs:duration value
pub fn duration_validator(value: &str) -> ValueResult<()> {
    if !DURATION_RE.is_match(value) || value.ends_with('P') || value.ends_with('T') {
        return Err(invalid(value, "duration"));
    }
    Ok(())
}

/// Check a Gregorian fragment (gYear, gYearMonth, gMonth, gDay, gMonthDay)
pub fn gregorian_validator(value: &str, type_name: &str) -> ValueResult<i64> {
    let (body, _tz) = split_timezone(value);
    let valid = match type_name {
        "gYear" => body.trim_start_matches('-').len() >= 4
            && body.trim_start_matches('-').chars().all(|c| c.is_ascii_digit()),
        "gYearMonth" => match body.rsplit_once('-') {
            Some((year, month)) => {
                year.trim_start_matches('-').len() >= 4
                    && year.trim_start_matches('-').chars().all(|c| c.is_ascii_digit())
                    && in_range(month, 1, 12)
            }
            None => false,
        },
        "gMonth" => body.strip_prefix("--").map_or(false, |m| in_range(m, 1, 12)),
        "gDay" => body.strip_prefix("---").map_or(false, |d| in_range(d, 1, 31)),
        "gMonthDay" => body
            .strip_prefix("--")
            .and_then(|md| md.split_once('-'))
            .map_or(false, |(m, d)| in_range(m, 1, 12) && in_range(d, 1, 31)),
        _ => false,
    };
    if !valid {
        return Err(invalid(value, type_name));
    }
    // Only gYear carries an ordered value
    if type_name == "gYear" {
        return body.parse::<i64>().map_err(|_| invalid(value, type_name));
    }
    Ok(0)
}

fn split_timezone(value: &str) -> (&str, Option<&str>) {
    if let Some(body) = value.strip_suffix('Z') {
        return (body, Some("Z"));
    }
    if let Some(split) = value.len().checked_sub(6).filter(|&at| at > 0) {
        if let (Some(body), Some(tz)) = (value.get(..split), value.get(split..)) {
            if (tz.starts_with('+') || tz.starts_with('-')) && tz.as_bytes()[3] == b':' {
                return (body, Some(tz));
            }
        }
    }
    (value, None)
}

fn in_range(digits: &str, min: u32, max: u32) -> bool {
    digits.len() == 2
        && digits
            .parse::<u32>()
            .map(|v| (min..=max).contains(&v))
            .unwrap_or(false)
}

/// Check an xs:language value
pub fn language_validator(value: &str) -> ValueResult<()> {
    if LANGUAGE_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid(value, "language"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_validator() {
        assert_eq!(decimal_validator("1.50").unwrap(), Decimal::new(150, 2));
        assert_eq!(decimal_validator("+3").unwrap(), Decimal::new(3, 0));
        assert_eq!(decimal_validator("5.").unwrap(), Decimal::new(5, 0));
        assert!(decimal_validator(".5").is_ok());
        assert!(decimal_validator("1e5").is_err());
        assert!(decimal_validator("abc").is_err());
        assert!(decimal_validator("").is_err());
    }

    #[test]
    fn test_integer_validator() {
        assert_eq!(integer_validator("42", "integer", None, None).unwrap(), 42);
        assert_eq!(integer_validator("-7", "integer", None, None).unwrap(), -7);
        assert!(integer_validator("abc", "integer", None, None).is_err());
        assert!(integer_validator("1.0", "integer", None, None).is_err());
        assert!(integer_validator("128", "byte", Some(-128), Some(127)).is_err());
        assert!(integer_validator("0", "positiveInteger", Some(1), None).is_err());
    }

    #[test]
    fn test_float_validator() {
        assert_eq!(float_validator("1.5e3", "double").unwrap(), 1500.0);
        assert!(float_validator("INF", "float").unwrap().is_infinite());
        assert!(float_validator("NaN", "float").unwrap().is_nan());
        assert!(float_validator("inf", "float").is_err());
        assert!(float_validator("1.2.3", "float").is_err());
    }

    #[test]
    fn test_boolean_validator() {
        assert!(boolean_validator("true").unwrap());
        assert!(!boolean_validator("0").unwrap());
        assert!(boolean_validator("yes").is_err());
    }

    #[test]
    fn test_binary_validators() {
        assert_eq!(hex_binary_validator("0FB7").unwrap(), vec![0x0F, 0xB7]);
        assert!(hex_binary_validator("0FB").is_err());
        assert!(hex_binary_validator("ZZ").is_err());
        assert_eq!(base64_binary_validator("aGVs bG8=").unwrap(), b"hello".to_vec());
        assert!(base64_binary_validator("!!!").is_err());
    }

    #[test]
    fn test_date_validators() {
        assert!(date_validator("2024-02-29").is_ok());
        assert!(date_validator("2023-02-29").is_err());
        assert!(date_validator("2024-13-01").is_err());
        assert_eq!(date_validator("2024-01-01Z").unwrap().1, Some(0));

        let a = datetime_validator("2024-01-01T12:00:00+02:00").unwrap();
        let b = datetime_validator("2024-01-01T10:00:00Z").unwrap();
        assert_eq!(a, b);
        assert!(datetime_validator("2024-01-01T24:00:00").is_ok());
        assert!(datetime_validator("2024-01-01T24:30:00").is_err());
        assert!(datetime_validator("2024-01-01 12:00:00").is_err());

        assert!(time_validator("13:20:00.5").is_ok());
        assert!(time_validator("25:00:00").is_err());
    }

    #[test]
    fn test_duration_and_gregorian() {
        assert!(duration_validator("P1Y2M3DT10H30M").is_ok());
        assert!(duration_validator("-PT0.5S").is_ok());
        assert!(duration_validator("P").is_err());
        assert!(duration_validator("P1DT").is_err());

        assert_eq!(gregorian_validator("2024", "gYear").unwrap(), 2024);
        assert!(gregorian_validator("2024-05", "gYearMonth").is_ok());
        assert!(gregorian_validator("--12", "gMonth").is_ok());
        assert!(gregorian_validator("--13", "gMonth").is_err());
        assert!(gregorian_validator("---31Z", "gDay").is_ok());
        assert!(gregorian_validator("--02-30", "gMonthDay").is_ok());
        assert!(gregorian_validator("24", "gYear").is_err());
    }

    #[test]
    fn test_datetime_at_the_edge_of_the_calendar() {
        use chrono::Datelike;

        let last = NaiveDate::MAX.year();
        let first = NaiveDate::MIN.year();
        assert!(datetime_validator(&format!("{}-12-31T23:59:59Z", last)).is_ok());

        let shifted_past_max = format!("{}-12-31T23:59:59-14:00", last);
        let err = datetime_validator(&shifted_past_max).unwrap_err();
        assert_eq!(err.reason.as_deref(), Some("out of range"));

        let shifted_before_min = format!("{}-01-01T00:00:00+14:00", first);
        assert!(datetime_validator(&shifted_before_min).is_err());

        let end_of_last_day = format!("{}-12-31T24:00:00", last);
        assert!(datetime_validator(&end_of_last_day).is_err());
    }

    #[test]
    fn test_gregorian_rejects_non_ascii() {
        assert!(gregorian_validator("x\u{e9}12345", "gYear").is_err());
        assert!(gregorian_validator("--\u{e9}12:34", "gMonthDay").is_err());
        assert!(gregorian_validator("\u{e9}\u{e9}\u{e9}\u{e9}", "gYearMonth").is_err());
        assert!(gregorian_validator("---\u{e9}+01:00", "gDay").is_err());
        assert_eq!(split_timezone("2024+01:00"), ("2024", Some("+01:00")));
        assert_eq!(split_timezone("\u{e9}2024"), ("\u{e9}2024", None));
    }

    #[test]
    fn test_language_validator() {
        assert!(language_validator("en-US").is_ok());
        assert!(language_validator("toolonglanguage").is_err());
    }
}
