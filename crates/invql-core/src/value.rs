//! Runtime values read from the record store and parsed from query literals.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::FieldKind;

/// Date literal format.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Naive datetime literal formats, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A single field value.
///
/// Stored values arrive untyped from JSON (`Null`, `Bool`, `Int`, `Float` or
/// `Text`) and are coerced to the field's kind on read, so dates stored as
/// strings compare as dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer, also used for record references.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Timestamp without a zone offset.
    DateTime(NaiveDateTime),
    /// Timestamp qualified with a zone offset (normalised to UTC).
    DateTimeTz(DateTime<Utc>),
}

/// The largest timestamp the record store can hold, used for open-ended
/// reservations and substituted for the `infinite` literal.
pub fn infinite() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|date| date.and_hms_micro_opt(23, 59, 59, 999_999))
        .unwrap_or(NaiveDateTime::MAX)
}

impl Value {
    /// The `infinite` sentinel, either naive or zone-qualified.
    pub fn infinite(zoned: bool) -> Value {
        if zoned {
            Value::DateTimeTz(infinite().and_utc())
        } else {
            Value::DateTime(infinite())
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value is the `infinite` sentinel in either form.
    pub fn is_infinite(&self) -> bool {
        match self {
            Value::DateTime(dt) => *dt == infinite(),
            Value::DateTimeTz(dt) => dt.naive_utc() == infinite(),
            _ => false,
        }
    }

    /// Convert a stored value to the typed form for a field kind.
    ///
    /// Values that cannot be converted are returned unchanged; the filter
    /// evaluator treats mismatched types as non-matching.
    pub fn coerce(self, kind: FieldKind) -> Value {
        match (kind, self) {
            (_, Value::Null) => Value::Null,
            (FieldKind::Boolean, Value::Int(i)) => Value::Bool(i != 0),
            (FieldKind::Boolean, Value::Text(s)) => {
                parse_bool(&s).map_or(Value::Text(s), Value::Bool)
            }
            (FieldKind::Numeric, Value::Text(s)) => parse_number(&s).unwrap_or(Value::Text(s)),
            (FieldKind::Date, Value::Text(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .map_or(Value::Text(s), Value::Date),
            (FieldKind::Date, Value::DateTime(dt)) => Value::Date(dt.date()),
            (FieldKind::DateTime, Value::Text(s)) => parse_datetime(&s).unwrap_or(Value::Text(s)),
            (FieldKind::DateTime, Value::Date(d)) => Value::DateTime(d.and_time(NaiveTime::MIN)),
            (_, other) => other,
        }
    }

    /// Parse a query literal for a field kind.
    ///
    /// Returns a human-readable reason on failure.
    pub fn parse_literal(text: &str, kind: FieldKind) -> Result<Value, String> {
        match kind {
            FieldKind::Text | FieldKind::LongText => Ok(Value::Text(text.to_string())),
            FieldKind::Boolean => parse_bool(text)
                .map(Value::Bool)
                .ok_or_else(|| "expected true or false".to_string()),
            FieldKind::Numeric => {
                parse_number(text).ok_or_else(|| "expected a number".to_string())
            }
            FieldKind::Reference => text
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| "expected a record id".to_string()),
            FieldKind::Date => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| "expected a date as YYYY-MM-DD".to_string()),
            FieldKind::DateTime => parse_datetime(text)
                .ok_or_else(|| "expected a timestamp as YYYY-MM-DD[ HH:MM[:SS]]".to_string()),
        }
    }

    /// Compare two values, if they are comparable.
    ///
    /// Integers and floats compare numerically, and a naive timestamp is read
    /// as UTC when compared against a zoned one.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::DateTimeTz(a), Value::DateTimeTz(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTimeTz(b)) => Some(a.and_utc().cmp(b)),
            (Value::DateTimeTz(a), Value::DateTime(b)) => Some(a.cmp(&b.and_utc())),
            _ => None,
        }
    }

    /// Equality that ignores case for text and falls back to [`Value::compare`]
    /// for everything else.
    pub fn eq_ignore_case(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }

    /// Textual form used by substring and prefix matching. `None` for null.
    pub fn text_form(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Character length of the textual form; null stays null.
    pub fn char_length(&self) -> Value {
        match self.text_form() {
            Some(s) => Value::Int(s.chars().count() as i64),
            None => Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::DateTimeTz(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%:z")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    text.parse::<i64>()
        .map(Value::Int)
        .or_else(|_| text.parse::<f64>().map(Value::Float))
        .ok()
}

fn parse_datetime(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Value::DateTimeTz(dt.with_timezone(&Utc)));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Value::DateTime(dt));
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .map(|d| Value::DateTime(d.and_time(NaiveTime::MIN)))
}
