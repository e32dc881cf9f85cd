//! Coerced argument values
//!
//! Query strings and form bodies arrive as text. Every value is converted to
//! the most specific type its spelling allows before it reaches a handler.

use serde::Serialize;
use std::fmt;

/// A single coerced argument
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A key that appeared more than once
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            // Keep a trailing ".0" so 3.0 does not print as the integer 3
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{v:.1}")
            }
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

/// Coerce one raw string.
///
/// Precedence: `false`/`no`, then `true`/`yes` (both case-insensitive), then
/// an all-ASCII-digit integer, then a float, otherwise the string itself.
/// A leading sign is not a digit, so `-5` becomes the float `-5.0`.
pub fn coerce(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("false") || raw.eq_ignore_ascii_case("no") {
        return Value::Bool(false);
    }
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("yes") {
        return Value::Bool(true);
    }
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        // Out of i64 range falls through to the float branch
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Int(i);
        }
    }
    match parse_float(raw.trim()) {
        Some(f) => Value::Float(f),
        None => Value::Str(raw.to_string()),
    }
}

/// Float parse that also takes `_` between digits, e.g. `1_000.5`
fn parse_float(raw: &str) -> Option<f64> {
    if !raw.contains('_') {
        return raw.parse().ok();
    }
    let bytes = raw.as_bytes();
    let separators_ok = bytes.iter().enumerate().all(|(i, b)| {
        *b != b'_'
            || (i > 0
                && bytes[i - 1].is_ascii_digit()
                && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
    });
    if !separators_ok {
        return None;
    }
    raw.replace('_', "").parse().ok()
}

/// Coerce every value of one key, collapsing a single value to a scalar
pub fn coerce_values(raw: &[String]) -> Value {
    let mut coerced: Vec<Value> = raw.iter().map(|v| coerce(v)).collect();
    if coerced.len() == 1 {
        coerced.remove(0)
    } else {
        Value::List(coerced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booleans() {
        for raw in ["true", "True", "yes", "Yes", "TRUE"] {
            assert_eq!(coerce(raw), Value::Bool(true), "{raw}");
        }
        for raw in ["false", "False", "no", "No", "NO"] {
            assert_eq!(coerce(raw), Value::Bool(false), "{raw}");
        }
    }

    #[test]
    fn test_numbers() {
        assert_eq!(coerce("42"), Value::Int(42));
        assert_eq!(coerce("007"), Value::Int(7));
        assert_eq!(coerce("2.75"), Value::Float(2.75));
        assert_eq!(coerce("1e3"), Value::Float(1000.0));
    }

    #[test]
    fn test_signed_number_is_float() {
        assert_eq!(coerce("-5"), Value::Float(-5.0));
        assert_eq!(coerce("+5"), Value::Float(5.0));
    }

    #[test]
    fn test_huge_integer_falls_back_to_float() {
        assert_eq!(coerce("99999999999999999999"), Value::Float(1e20));
    }

    #[test]
    fn test_strings_left_alone() {
        assert_eq!(coerce("abc"), Value::Str("abc".to_string()));
        assert_eq!(coerce("10.0.0.1"), Value::Str("10.0.0.1".to_string()));
        assert_eq!(coerce("/system reboot"), Value::Str("/system reboot".to_string()));
    }

    #[test]
    fn test_single_value_collapses_to_scalar() {
        assert_eq!(coerce_values(&["1".to_string()]), Value::Int(1));
        assert_eq!(
            coerce_values(&["1".to_string(), "2".to_string()]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_underscore_separators() {
        assert_eq!(coerce("1_000"), Value::Float(1000.0));
        assert_eq!(coerce("1_000.2_5"), Value::Float(1000.25));
        assert_eq!(coerce("_1"), Value::Str("_1".to_string()));
        assert_eq!(coerce("1__0"), Value::Str("1__0".to_string()));
        assert_eq!(coerce("1_"), Value::Str("1_".to_string()));
        assert_eq!(coerce("ether_1"), Value::Str("ether_1".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Bool(false).to_string(), "False");
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Str("a".into())]).to_string(),
            "[1, a]"
        );
    }
}
