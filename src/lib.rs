//! # txchain - Parameter Recomputation for USRP Transmitters
//!
//! txchain keeps the runtime parameters of a software-defined-radio transmit
//! flow graph consistent. Each transmitter (AM, ASK/PSK/FSK, FM, subcarrier,
//! NTSC, ATSC, PPM) is described by a declarative table of primary parameters
//! (set by an operator) and derived parameters (pure functions of others).
//! A change to any primary parameter is propagated through the dependency DAG
//! in a stable topological order, and every changed value is pushed to the
//! external block setters (sinks) bound to it.
//!
//! ## Quick Start
//!
//! ```rust
//! use txchain::config::ConfigRecord;
//! use txchain::flowgraphs::Transmitter;
//! use txchain::sink::SinkRecorder;
//!
//! let config = ConfigRecord::new()
//!     .with("centerFreq", 915.0)
//!     .with("rfPwr", -60.0)
//!     .with("bitsPerSym", 2)
//!     .with("symRate", 100.0);
//! let mut params = Transmitter::Psk.initialize(&config).unwrap();
//!
//! let recorder = SinkRecorder::new();
//! params
//!     .bind("blocks_repeat_0.set_interpolation", recorder.sink("blocks_repeat_0.set_interpolation"))
//!     .unwrap();
//!
//! // 5 Msps / 77 ksym/s floors to a repeat factor of 64
//! params.set("symRate", 77.0).unwrap();
//! assert_eq!(params.real("achievedSymRate").unwrap(), 78.125);
//! assert_eq!(recorder.values_for("blocks_repeat_0.set_interpolation").len(), 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! FlowgraphTable ──build──> ParameterGraph ──initialize(config)──> ParameterSet
//!  (parameter)              (dependency_graph)                     (parameter_set)
//!                                                                    │ set()
//!                                                                    ▼
//!                                                                  Sink::apply
//! ```
//!
//! - [`parameter`]: declarative `ParameterSpec` entries
//! - [`dependency_graph`]: DAG validation and stable evaluation order
//! - [`parameter_set`]: staged, atomic updates and sink dispatch
//! - [`flowgraphs`]: the table of every transmitter variant
//! - [`formulas`] and [`firdes`]: derived quantities and FIR tap designers

pub mod config;
pub mod dependency_graph;
pub mod domain;
pub mod error;
pub mod firdes;
pub mod flowgraphs;
pub mod formulas;
pub mod parameter;
pub mod parameter_set;
pub mod sink;
pub mod value;

pub use config::{ConfigRecord, ConfigValue, StationSettings};
pub use domain::{Domain, Kind};
pub use error::{GraphError, GraphResult};
pub use flowgraphs::Transmitter;
pub use parameter::{FlowgraphTable, ParameterSpec};
pub use parameter_set::{Change, ParameterGraph, ParameterSet};
pub use sink::{Sink, SinkRecorder, TracingSink};
pub use value::Value;
