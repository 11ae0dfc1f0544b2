//! Declarative parameter tables
//!
//! Each transmitter flow graph is described by one `FlowgraphTable`: an ordered
//! list of `ParameterSpec` entries naming the parameter, its kind and domain,
//! whether it is user-editable (primary) or computed (derived), the parameters
//! a derived value depends on, and the external block setters (sinks) that
//! receive its value.
//!
//! # Example
//! ```
//! use txchain::parameter::{FlowgraphTable, ParameterSpec};
//! use txchain::domain::Kind;
//! use txchain::value::Value;
//!
//! let table = FlowgraphTable::new("demo", "Demo transmitter")
//!     .parameter(ParameterSpec::primary("centerFreq", Kind::Real).with_range(50.0, 2200.0))
//!     .parameter(
//!         ParameterSpec::derived("usrpCenterFreq", Kind::Real, &["centerFreq"], |inputs| {
//!             Ok(Value::Real(inputs.real("centerFreq")? * 1e6))
//!         })
//!         .with_sink("uhd_usrp_sink_0.set_center_freq"),
//!     );
//! assert_eq!(table.parameters.len(), 2);
//! ```

use crate::domain::{Domain, Kind};
use crate::value::Value;

/// Computes a derived value from its declared dependencies
pub type Formula = fn(&Inputs<'_>) -> Result<Value, String>;

/// Whether a parameter is set by the user or computed
#[derive(Clone, Debug)]
pub enum Role {
    /// User-editable; required in the initial configuration when `default` is `None`
    Primary { default: Option<Value> },
    /// Pure function of other parameters
    Derived {
        dependencies: Vec<String>,
        formula: Formula,
    },
}

/// One row of a flow-graph parameter table
#[derive(Clone, Debug)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: Kind,
    pub domain: Domain,
    pub role: Role,
    /// External setters invoked with this parameter's value when it changes
    pub sinks: Vec<String>,
    /// Human-readable label with units
    pub label: Option<String>,
}

impl ParameterSpec {
    /// A required primary parameter with an unrestricted domain
    pub fn primary(name: &str, kind: Kind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            domain: Domain::Any,
            role: Role::Primary { default: None },
            sinks: Vec::new(),
            label: None,
        }
    }

    /// A primary fixed to a single value (e.g. a hard-wired USRP gain)
    pub fn fixed(name: &str, kind: Kind, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::primary(name, kind)
            .with_domain(Domain::Options(vec![value.clone()]))
            .with_default(value)
    }

    /// A derived parameter computed by `formula` from `dependencies`
    pub fn derived(name: &str, kind: Kind, dependencies: &[&str], formula: Formula) -> Self {
        Self {
            name: name.to_string(),
            kind,
            domain: Domain::Any,
            role: Role::Derived {
                dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
                formula,
            },
            sinks: Vec::new(),
            label: None,
        }
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_range(self, min: f64, max: f64) -> Self {
        self.with_domain(Domain::range(min, max))
    }

    pub fn with_options<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with_domain(Domain::options(values))
    }

    /// Make a primary optional by giving it a default; ignored for derived parameters
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        if let Role::Primary { default } = &mut self.role {
            *default = Some(value.into());
        }
        self
    }

    pub fn with_sink(mut self, sink: &str) -> Self {
        self.sinks.push(sink.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.role, Role::Primary { .. })
    }

    /// Primary with no default
    pub fn is_required(&self) -> bool {
        matches!(self.role, Role::Primary { default: None })
    }

    pub fn default_value(&self) -> Option<&Value> {
        match &self.role {
            Role::Primary { default } => default.as_ref(),
            Role::Derived { .. } => None,
        }
    }

    /// Declared dependencies (empty for primaries)
    pub fn dependencies(&self) -> &[String] {
        match &self.role {
            Role::Primary { .. } => &[],
            Role::Derived { dependencies, .. } => dependencies,
        }
    }
}

/// The full parameter table of one flow-graph variant
#[derive(Clone, Debug)]
pub struct FlowgraphTable {
    /// Short identifier, e.g. `psk`
    pub name: String,
    /// Window title of the transmitter
    pub title: String,
    pub parameters: Vec<ParameterSpec>,
}

impl FlowgraphTable {
    pub fn new(name: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            parameters: Vec::new(),
        }
    }

    pub fn parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// Append a group of entries, keeping their order
    pub fn parameters(mut self, specs: impl IntoIterator<Item = ParameterSpec>) -> Self {
        self.parameters.extend(specs);
        self
    }

    pub fn find(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Read-only view of a derived parameter's dependencies during evaluation
///
/// Only declared dependencies are visible; asking for anything else is an
/// error, so a formula cannot silently read a value that will not be
/// recomputed before it.
pub struct Inputs<'a> {
    parameter: &'a str,
    entries: Vec<(&'a str, &'a Value)>,
}

impl<'a> Inputs<'a> {
    pub fn new(parameter: &'a str, entries: Vec<(&'a str, &'a Value)>) -> Self {
        Self { parameter, entries }
    }

    /// Name of the parameter being computed
    pub fn parameter(&self) -> &str {
        self.parameter
    }

    pub fn get(&self, name: &str) -> Result<&'a Value, String> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| format!("'{}' is not a declared dependency", name))
    }

    pub fn real(&self, name: &str) -> Result<f64, String> {
        let value = self.get(name)?;
        value
            .as_real()
            .ok_or_else(|| format!("'{}' is {}, expected a number", name, value.type_name()))
    }

    pub fn integer(&self, name: &str) -> Result<i64, String> {
        let value = self.get(name)?;
        value
            .as_integer()
            .ok_or_else(|| format!("'{}' is {}, expected an integer", name, value.type_name()))
    }

    pub fn text(&self, name: &str) -> Result<&'a str, String> {
        let value = self.get(name)?;
        value
            .as_text()
            .ok_or_else(|| format!("'{}' is {}, expected text", name, value.type_name()))
    }
}
