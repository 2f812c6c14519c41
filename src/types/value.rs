//! Scalar values for element text and attribute values
//!
//! Setters accept anything string-coercible; this module defines that set
//! and how each value renders as XML text.

use std::fmt;

/// A string-coercible value stored as element text or attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    /// String value
    String(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value, rendered as `"1"` or `""`
    Boolean(bool),
}

impl XmlValue {
    /// Get the value as a string, if it is a string type
    pub fn as_str(&self) -> Option<&str> {
        match self {
            XmlValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is an integer type
    pub fn as_int(&self) -> Option<i64> {
        match self {
            XmlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a boolean, if it is a boolean type
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            XmlValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for XmlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlValue::String(s) => write!(f, "{}", s),
            XmlValue::Integer(i) => write!(f, "{}", i),
            XmlValue::Float(x) => write!(f, "{}", x),
            XmlValue::Boolean(true) => write!(f, "1"),
            XmlValue::Boolean(false) => Ok(()),
        }
    }
}

impl From<String> for XmlValue {
    fn from(s: String) -> Self {
        XmlValue::String(s)
    }
}

impl From<&str> for XmlValue {
    fn from(s: &str) -> Self {
        XmlValue::String(s.to_string())
    }
}

impl From<&String> for XmlValue {
    fn from(s: &String) -> Self {
        XmlValue::String(s.clone())
    }
}

impl From<i64> for XmlValue {
    fn from(i: i64) -> Self {
        XmlValue::Integer(i)
    }
}

impl From<i32> for XmlValue {
    fn from(i: i32) -> Self {
        XmlValue::Integer(i64::from(i))
    }
}

impl From<f64> for XmlValue {
    fn from(x: f64) -> Self {
        XmlValue::Float(x)
    }
}

impl From<bool> for XmlValue {
    fn from(b: bool) -> Self {
        XmlValue::Boolean(b)
    }
}
