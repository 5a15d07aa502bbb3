//! Typed key payloads.
//!
//! Every [`Key`](crate::Key) carries a [`Value`]. Formats without explicit
//! typing (key-value, INI, 2D tables) read their values as [`Value::Raw`]
//! or [`Value::Chars`]; [`guess_value_type`] and [`Value::guess`] turn such
//! text into native values when a caller wants them.
//!
//! ## Binary layout
//!
//! [`Value::to_bytes`] produces the fixed-width native-endian representation
//! of numeric values (`i32`, `f32`, `f64`, one byte for `bool`) and the
//! literal bytes for `Chars`/`Raw`. [`Value::from_bytes`] is its inverse and
//! checks the width instead of reinterpreting a buffer blindly.
//!
//! ## Examples
//!
//! ```rust
//! use uconfig::{guess_value_type, Value, ValueType};
//!
//! assert_eq!(guess_value_type(b"26978274"), ValueType::Integer);
//! assert_eq!(guess_value_type(b"FaLsE"), ValueType::Bool);
//! assert_eq!(guess_value_type(b"633.401E23"), ValueType::Raw);
//!
//! assert_eq!(Value::guess(b"'quoted'"), Value::Chars(b"quoted".to_vec()));
//! assert_eq!(Value::guess(b"-42"), Value::Integer(-42));
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a key's payload is interpreted.
///
/// `List` is a reserved flag bit; no codec produces it and no [`Value`]
/// variant carries it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueType {
    #[default]
    Raw = 0,
    Bool = 1,
    Chars = 2,
    Integer = 3,
    Float = 4,
    Double = 5,
    List = 128,
}

impl ValueType {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ValueType::Raw),
            1 => Some(ValueType::Bool),
            2 => Some(ValueType::Chars),
            3 => Some(ValueType::Integer),
            4 => Some(ValueType::Float),
            5 => Some(ValueType::Double),
            128 => Some(ValueType::List),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueType::Raw => "raw",
            ValueType::Bool => "bool",
            ValueType::Chars => "chars",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::List => "list",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key payload.
///
/// `Chars` and `Raw` are byte strings with explicit length; they may hold
/// embedded zero bytes and are never assumed to be UTF-8.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Raw(Vec<u8>),
    Bool(bool),
    Chars(Vec<u8>),
    Integer(i32),
    Float(f32),
    Double(f64),
}

impl Default for Value {
    fn default() -> Self {
        Value::Raw(Vec::new())
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Value::Raw(_) => ValueType::Raw,
            Value::Bool(_) => ValueType::Bool,
            Value::Chars(_) => ValueType::Chars,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
        }
    }

    /// Returns the byte payload of `Raw` and `Chars` values.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Raw(bytes) | Value::Chars(bytes) => Some(bytes),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Converts numeric values to `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(f64::from(*i)),
            Value::Float(f) => Some(f64::from(*f)),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the payload as UTF-8 text when it is `Raw`/`Chars` and valid.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Fixed-width native-endian encoding for numbers, literal bytes otherwise.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Raw(bytes) | Value::Chars(bytes) => bytes.clone(),
            Value::Bool(b) => vec![u8::from(*b)],
            Value::Integer(i) => i.to_ne_bytes().to_vec(),
            Value::Float(f) => f.to_ne_bytes().to_vec(),
            Value::Double(d) => d.to_ne_bytes().to_vec(),
        }
    }

    /// Rebuilds a value from its binary payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] when a numeric payload has the wrong
    /// width, and [`Error::InvalidOperation`] for the reserved `List` flag.
    pub fn from_bytes(value_type: ValueType, bytes: &[u8]) -> Result<Self> {
        fn fixed<const N: usize>(name: &'static str, bytes: &[u8]) -> Result<[u8; N]> {
            bytes.try_into().map_err(|_| Error::InvalidValue {
                expected: name,
                width: N,
                found: bytes.len(),
            })
        }

        Ok(match value_type {
            ValueType::Raw => Value::Raw(bytes.to_vec()),
            ValueType::Chars => Value::Chars(bytes.to_vec()),
            ValueType::Bool => Value::Bool(fixed::<1>("bool", bytes)?[0] != 0),
            ValueType::Integer => Value::Integer(i32::from_ne_bytes(fixed("integer", bytes)?)),
            ValueType::Float => Value::Float(f32::from_ne_bytes(fixed("float", bytes)?)),
            ValueType::Double => Value::Double(f64::from_ne_bytes(fixed("double", bytes)?)),
            ValueType::List => {
                return Err(Error::invalid_operation("the list flag carries no payload"))
            }
        })
    }

    /// Textual form used by the writers.
    ///
    /// Finite floats and doubles are written in plain decimal notation with
    /// a decimal point, never with an exponent, so that they guess back as
    /// doubles rather than integers or `Raw`.
    #[must_use]
    pub fn to_text(&self) -> Vec<u8> {
        match self {
            Value::Raw(bytes) | Value::Chars(bytes) => bytes.clone(),
            Value::Bool(true) => b"true".to_vec(),
            Value::Bool(false) => b"false".to_vec(),
            Value::Integer(i) => i.to_string().into_bytes(),
            Value::Float(f) => decimal_text(f.to_string(), f.is_finite()),
            Value::Double(d) => decimal_text(d.to_string(), d.is_finite()),
        }
    }

    /// Parses an expression into the native value [`guess_value_type`] picks.
    ///
    /// Quoted expressions lose their quotes. Numbers that do not fit their
    /// native width stay `Raw`, so nothing is silently truncated.
    #[must_use]
    pub fn guess(expression: &[u8]) -> Self {
        let raw = || Value::Raw(expression.to_vec());
        match guess_value_type(expression) {
            ValueType::Chars => Value::Chars(expression[1..expression.len() - 1].to_vec()),
            ValueType::Bool => Value::Bool(expression.eq_ignore_ascii_case(b"true")),
            ValueType::Integer => std::str::from_utf8(expression)
                .ok()
                .and_then(|s| s.parse::<i32>().ok())
                .map_or_else(raw, Value::Integer),
            ValueType::Double | ValueType::Float => std::str::from_utf8(expression)
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .map_or_else(raw, Value::Double),
            ValueType::Raw | ValueType::List => raw(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Chars(value.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Chars(value.into_bytes())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_text()))
    }
}

fn decimal_text(mut text: String, finite: bool) -> Vec<u8> {
    if finite && !text.contains('.') {
        text.push_str(".0");
    }
    text.into_bytes()
}

/// Guesses how an untyped expression should be interpreted.
///
/// The heuristic is conservative: anything that is not unambiguously a
/// quoted string, a boolean or a plain decimal number stays `Raw`.
///
/// - matching `"…"` or `'…'` quotes → `Chars`
/// - exactly `true`/`false`, any case → `Bool`
/// - digits with an optional leading sign directly followed by a digit →
///   `Integer`, or `Double` when a `.` appears
/// - everything else (exponents, trailing garbage, lone signs) → `Raw`
#[must_use]
pub fn guess_value_type(expression: &[u8]) -> ValueType {
    let length = expression.len();
    if length == 0 {
        return ValueType::Raw;
    }

    let first = expression[0];
    if first == b'"' || first == b'\'' {
        return if length >= 2 && expression[length - 1] == first {
            ValueType::Chars
        } else {
            ValueType::Raw
        };
    }

    if expression.eq_ignore_ascii_case(b"true") || expression.eq_ignore_ascii_case(b"false") {
        return ValueType::Bool;
    }

    let mut has_digit = false;
    let mut has_point = false;
    for (pos, &ch) in expression.iter().enumerate() {
        match ch {
            b'0'..=b'9' => has_digit = true,
            b'.' => has_point = true,
            b'+' | b'-' if pos == 0 => {
                if !expression.get(1).is_some_and(u8::is_ascii_digit) {
                    return ValueType::Raw;
                }
            }
            _ => return ValueType::Raw,
        }
    }

    match (has_digit, has_point) {
        (true, true) => ValueType::Double,
        (true, false) => ValueType::Integer,
        _ => ValueType::Raw,
    }
}
