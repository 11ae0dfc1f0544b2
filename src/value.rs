//! Parameter values
//!
//! A flow-graph parameter is a scalar (frequency, power, index), a text value
//! (file names, addresses, modulation labels), a complex block constant, or a
//! vector of filter taps.

use num_complex::Complex64;
use serde::Serialize;
use std::fmt;

/// Current value of a primary or derived parameter
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Real(f64),
    Integer(i64),
    Text(String),
    Complex(Complex64),
    Taps(Vec<f64>),
}

impl Value {
    /// Numeric view of the value (integers widen to f64)
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer view; reals are accepted only when integral
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Real(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<Complex64> {
        match self {
            Value::Complex(c) => Some(*c),
            Value::Real(v) => Some(Complex64::new(*v, 0.0)),
            Value::Integer(v) => Some(Complex64::new(*v as f64, 0.0)),
            _ => None,
        }
    }

    pub fn as_taps(&self) -> Option<&[f64]> {
        match self {
            Value::Taps(t) => Some(t),
            _ => None,
        }
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Real(_) => "real",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Complex(_) => "complex",
            Value::Taps(_) => "taps",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Real(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Complex(c) => write!(f, "{}", c),
            Value::Taps(t) => write!(f, "[{} taps]", t.len()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
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

impl From<Complex64> for Value {
    fn from(c: Complex64) -> Self {
        Value::Complex(c)
    }
}

impl From<Vec<f64>> for Value {
    fn from(t: Vec<f64>) -> Self {
        Value::Taps(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_views() {
        assert_eq!(Value::Real(3.0).as_integer(), Some(3));
        assert_eq!(Value::Real(3.5).as_integer(), None);
        assert_eq!(Value::Integer(7).as_real(), Some(7.0));
        assert_eq!(Value::Text("x".into()).as_real(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Real(300.0).to_string(), "300");
        assert_eq!(Value::Taps(vec![0.0; 5]).to_string(), "[5 taps]");
        assert_eq!(Value::from("8PSK").to_string(), "\"8PSK\"");
    }

    #[test]
    fn test_serialize_untagged() {
        let json = serde_json::to_string(&Value::Real(1.5)).unwrap();
        assert_eq!(json, "1.5");
        let json = serde_json::to_string(&Value::from("AM")).unwrap();
        assert_eq!(json, "\"AM\"");
    }
}
