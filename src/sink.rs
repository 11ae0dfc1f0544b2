//! External sinks
//!
//! A sink stands in for one block setter of the running flow graph
//! (`uhd_usrp_sink_0.set_gain`, `filter_fft_rrc_filter_0.set_taps`, ...).
//! The parameter set invokes it with the new value whenever the bound
//! parameter changes. What the setter does is outside this crate.

use crate::error::SinkError;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;

/// One-way setter call into an external block
pub trait Sink {
    fn apply(&mut self, value: &Value) -> Result<(), SinkError>;
}

impl<F> Sink for F
where
    F: FnMut(&Value) -> Result<(), SinkError>,
{
    fn apply(&mut self, value: &Value) -> Result<(), SinkError> {
        self(value)
    }
}

/// A sink invocation captured by a [`SinkRecorder`]
#[derive(Clone, Debug, PartialEq)]
pub struct SinkCall {
    pub sink: String,
    pub value: Value,
}

/// Shared log of sink calls, in invocation order
///
/// Hand out one [`RecordingSink`] per setter and inspect the combined call
/// sequence afterwards.
#[derive(Clone, Debug, Default)]
pub struct SinkRecorder {
    calls: Rc<RefCell<Vec<SinkCall>>>,
}

impl SinkRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that records into this log under `name`
    pub fn sink(&self, name: &str) -> RecordingSink {
        RecordingSink {
            name: name.to_string(),
            calls: Rc::clone(&self.calls),
        }
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.borrow().clone()
    }

    /// Values received by one sink, oldest first
    pub fn values_for(&self, sink: &str) -> Vec<Value> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.sink == sink)
            .map(|c| c.value.clone())
            .collect()
    }

    /// Most recent value received by one sink
    pub fn last(&self, sink: &str) -> Option<Value> {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find(|c| c.sink == sink)
            .map(|c| c.value.clone())
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

/// Sink that appends every call to a [`SinkRecorder`]
#[derive(Debug)]
pub struct RecordingSink {
    name: String,
    calls: Rc<RefCell<Vec<SinkCall>>>,
}

impl Sink for RecordingSink {
    fn apply(&mut self, value: &Value) -> Result<(), SinkError> {
        self.calls.borrow_mut().push(SinkCall {
            sink: self.name.clone(),
            value: value.clone(),
        });
        Ok(())
    }
}

/// Sink that only logs, for dry runs without hardware
#[derive(Debug)]
pub struct TracingSink {
    name: String,
}

impl TracingSink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Sink for TracingSink {
    fn apply(&mut self, value: &Value) -> Result<(), SinkError> {
        info!("{}({})", self.name, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_keeps_order() {
        let recorder = SinkRecorder::new();
        let mut gain = recorder.sink("usrp.set_gain");
        let mut freq = recorder.sink("usrp.set_center_freq");

        gain.apply(&Value::Real(10.0)).unwrap();
        freq.apply(&Value::Real(300e6)).unwrap();
        gain.apply(&Value::Real(0.0)).unwrap();

        assert_eq!(recorder.calls().len(), 3);
        assert_eq!(
            recorder.values_for("usrp.set_gain"),
            vec![Value::Real(10.0), Value::Real(0.0)]
        );
        assert_eq!(recorder.last("usrp.set_center_freq"), Some(Value::Real(300e6)));

        recorder.clear();
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |v: &Value| -> Result<(), SinkError> {
                seen.push(v.clone());
                Ok(())
            };
            sink.apply(&Value::Integer(1)).unwrap();
        }
        assert_eq!(seen, vec![Value::Integer(1)]);
    }
}
