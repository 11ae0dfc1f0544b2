//! Error types for parameter graphs
//!
//! Every failure is reported synchronously to the caller of `initialize`,
//! `set` or `get`. Nothing here is retried.

use crate::value::Value;
use std::fmt;

/// Error returned by an external sink (block setter)
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while building, initializing or updating a parameter set
#[derive(Debug)]
pub enum GraphError {
    /// Initial configuration is missing a required primary or carries a bad entry
    Configuration { parameter: String, reason: String },
    /// Value lies outside the parameter's declared range or option set
    InvalidValue {
        parameter: String,
        value: Value,
        reason: String,
    },
    /// Parameter name is not declared in the table
    UnknownParameter(String),
    /// Declared dependencies do not form a DAG
    CyclicDependency { parameter: String },
    /// Attempt to set a derived parameter directly
    DerivedParameter(String),
    /// Two table entries share a name
    DuplicateParameter(String),
    /// Sink name is not declared by any parameter
    UnknownSink(String),
    /// Two table entries declare the same sink
    DuplicateSink(String),
    /// A formula could not produce a value
    Evaluation { parameter: String, reason: String },
    /// An external sink failed; propagated unchanged
    Sink {
        sink: String,
        parameter: String,
        source: SinkError,
    },
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serde(String),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Configuration { parameter, reason } => {
                write!(f, "Configuration error for '{}': {}", parameter, reason)
            }
            GraphError::InvalidValue {
                parameter,
                value,
                reason,
            } => write!(f, "Invalid value {} for '{}': {}", value, parameter, reason),
            GraphError::UnknownParameter(name) => write!(f, "Unknown parameter: {}", name),
            GraphError::CyclicDependency { parameter } => {
                write!(f, "Cyclic dependency through parameter '{}'", parameter)
            }
            GraphError::DerivedParameter(name) => {
                write!(f, "Parameter '{}' is derived and cannot be set", name)
            }
            GraphError::DuplicateParameter(name) => {
                write!(f, "Parameter '{}' is declared more than once", name)
            }
            GraphError::UnknownSink(name) => write!(f, "Unknown sink: {}", name),
            GraphError::DuplicateSink(name) => {
                write!(f, "Sink '{}' is bound to more than one parameter", name)
            }
            GraphError::Evaluation { parameter, reason } => {
                write!(f, "Cannot evaluate '{}': {}", parameter, reason)
            }
            GraphError::Sink {
                sink,
                parameter,
                source,
            } => write!(f, "Sink {} failed for '{}': {}", sink, parameter, source),
            GraphError::Io(e) => write!(f, "IO error: {}", e),
            GraphError::Serde(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphError::Sink { source, .. } => Some(source.as_ref()),
            GraphError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GraphError {
    fn from(e: std::io::Error) -> Self {
        GraphError::Io(e)
    }
}

/// Result type for parameter graph operations
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_value() {
        let err = GraphError::InvalidValue {
            parameter: "centerFreq".to_string(),
            value: Value::Real(2500.0),
            reason: "must be between 50 and 2200".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 2500 for 'centerFreq': must be between 50 and 2200"
        );
    }

    #[test]
    fn test_sink_error_source() {
        use std::error::Error;

        let err = GraphError::Sink {
            sink: "uhd_usrp_sink_0.set_gain".to_string(),
            parameter: "gain".to_string(),
            source: "device unreachable".into(),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("device unreachable"));
    }
}
