//! Parameter kinds and valid domains
//!
//! Mirrors the input checks of the transmitter dialogs: sliders with a
//! minimum and maximum, and combo boxes / radio groups with a fixed option set.

use crate::value::Value;
use std::fmt;

/// Declared kind of a parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Continuous value (frequency, power, alpha)
    Real,
    /// Whole number (counts, port numbers)
    Integer,
    /// Enumerated selection (selector index, on/off, bits per symbol)
    Choice,
    /// Free text (file names, addresses, labels)
    Text,
    /// Complex block constant
    Complex,
    /// Filter tap vector
    Taps,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Real => write!(f, "real"),
            Kind::Integer => write!(f, "integer"),
            Kind::Choice => write!(f, "choice"),
            Kind::Text => write!(f, "text"),
            Kind::Complex => write!(f, "complex"),
            Kind::Taps => write!(f, "taps"),
        }
    }
}

/// Set of values a parameter may take
#[derive(Clone, Debug, PartialEq)]
pub enum Domain {
    /// Any value of the right kind
    Any,
    /// Inclusive numeric range
    Range { min: f64, max: f64 },
    /// Enumerated options
    Options(Vec<Value>),
}

impl Domain {
    pub fn range(min: f64, max: f64) -> Self {
        Domain::Range { min, max }
    }

    pub fn options<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Domain::Options(values.into_iter().map(Into::into).collect())
    }

    /// Coerce `value` to `kind` and check it against this domain
    ///
    /// Returns the coerced value, or a human-readable reason for rejection.
    pub fn validate(&self, kind: Kind, value: &Value) -> Result<Value, String> {
        let coerced = coerce(kind, value)?;

        match self {
            Domain::Any => Ok(coerced),
            Domain::Range { min, max } => {
                let v = coerced
                    .as_real()
                    .ok_or_else(|| format!("{} value has no numeric range", coerced.type_name()))?;
                if v >= *min && v <= *max {
                    Ok(coerced)
                } else {
                    Err(format!("must be between {} and {}", min, max))
                }
            }
            Domain::Options(options) => {
                if options.iter().any(|o| option_matches(o, &coerced)) {
                    Ok(coerced)
                } else {
                    let listed: Vec<String> = options.iter().map(|o| o.to_string()).collect();
                    Err(format!("must be one of {{{}}}", listed.join(", ")))
                }
            }
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Any => write!(f, "any"),
            Domain::Range { min, max } => write!(f, "[{}, {}]", min, max),
            Domain::Options(options) => {
                let listed: Vec<String> = options.iter().map(|o| o.to_string()).collect();
                write!(f, "{{{}}}", listed.join(", "))
            }
        }
    }
}

fn option_matches(option: &Value, value: &Value) -> bool {
    match (option.as_real(), value.as_real()) {
        (Some(a), Some(b)) => a == b,
        _ => option == value,
    }
}

fn coerce(kind: Kind, value: &Value) -> Result<Value, String> {
    let mismatch = || format!("expected {} value, got {}", kind, value.type_name());

    match kind {
        Kind::Real => match value.as_real() {
            Some(v) if v.is_nan() => Err("NaN is not a valid value".to_string()),
            Some(v) => Ok(Value::Real(v)),
            None => Err(mismatch()),
        },
        Kind::Integer | Kind::Choice => value.as_integer().map(Value::Integer).ok_or_else(mismatch),
        Kind::Text => match value {
            Value::Text(_) => Ok(value.clone()),
            _ => Err(mismatch()),
        },
        Kind::Complex => value.as_complex().map(Value::Complex).ok_or_else(mismatch),
        Kind::Taps => match value {
            Value::Taps(_) => Ok(value.clone()),
            _ => Err(mismatch()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds_are_inclusive() {
        let d = Domain::range(50.0, 2200.0);
        assert!(d.validate(Kind::Real, &Value::Real(50.0)).is_ok());
        assert!(d.validate(Kind::Real, &Value::Real(2200.0)).is_ok());
        assert!(d.validate(Kind::Real, &Value::Real(49.99)).is_err());
        assert!(d.validate(Kind::Real, &Value::Real(2200.01)).is_err());
    }

    #[test]
    fn test_integer_coerces_to_real() {
        let d = Domain::range(-80.0, -30.0);
        let v = d.validate(Kind::Real, &Value::Integer(-55)).unwrap();
        assert_eq!(v, Value::Real(-55.0));
    }

    #[test]
    fn test_choice_options() {
        let d = Domain::options([1i64, 2, 3]);
        assert_eq!(
            d.validate(Kind::Choice, &Value::Real(3.0)).unwrap(),
            Value::Integer(3)
        );
        let err = d.validate(Kind::Choice, &Value::Integer(4)).unwrap_err();
        assert_eq!(err, "must be one of {1, 2, 3}");
        assert!(d.validate(Kind::Choice, &Value::Real(2.5)).is_err());
    }

    #[test]
    fn test_nan_rejected() {
        assert!(Domain::Any.validate(Kind::Real, &Value::Real(f64::NAN)).is_err());
    }

    #[test]
    fn test_text_kind() {
        assert!(Domain::Any.validate(Kind::Text, &Value::from("a.ts")).is_ok());
        assert!(Domain::Any.validate(Kind::Text, &Value::Real(1.0)).is_err());
    }
}
