//! Typed expression values

use std::cmp::Ordering;
use std::fmt;

/// Result of every skin expression
///
/// Comparison rule: if either side is a string both are compared as
/// strings, otherwise as integers (`true` is 1, `false` is 0).
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Number(i64),
    Boolean(bool),
}

impl Value {
    /// Integer view; strings use their leading integer, 0 when there is none
    pub fn as_number(&self) -> i64 {
        match self {
            Self::String(s) => leading_integer(s),
            Self::Number(n) => *n,
            Self::Boolean(b) => i64::from(*b),
        }
    }

    /// Truth value; empty strings and zero are false
    pub fn as_bool(&self) -> bool {
        match self {
            Self::String(s) => !s.is_empty(),
            Self::Number(n) => *n != 0,
            Self::Boolean(b) => *b,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
        }
    }

    /// Three-way comparison following the string-aware rule
    pub fn compare(&self, other: &Value) -> Ordering {
        if self.is_string() || other.is_string() {
            self.to_string().cmp(&other.to_string())
        } else {
            self.as_number().cmp(&other.as_number())
        }
    }
}

/// atoi-style parse: optional whitespace and sign, then digits
fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.wrapping_mul(10).wrapping_add(i64::from(b - b'0'));
    }
    if negative { value.wrapping_neg() } else { value }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => f.write_str(if *b { "1" } else { "0" }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::String(String::new())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
