//! Parameter recomputation graph
//!
//! `ParameterGraph` is the validated, immutable form of a `FlowgraphTable`:
//! names resolved to indices, sinks resolved to their owning parameter, and
//! a stable evaluation order. `ParameterSet` holds the current values of one
//! running flow graph and is the only place they change.
//!
//! # Update model
//! ```text
//! set(name, value)
//!   validate against domain      ── fails: nothing changes
//!   stage value, recompute every descendant in evaluation order
//!                                ── fails: nothing changes
//!   commit staged values
//!   invoke sinks of every changed parameter, in evaluation order
//! ```

use crate::config::{ConfigRecord, ConfigValue};
use crate::dependency_graph::{DependencyGraph, ParamId};
use crate::error::{GraphError, GraphResult};
use crate::parameter::{FlowgraphTable, Inputs, ParameterSpec, Role};
use crate::sink::Sink;
use crate::value::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// A parameter whose value changed during an update
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub parameter: String,
    pub value: Value,
}

/// Validated flow-graph table with its dependency structure
pub struct ParameterGraph {
    table: FlowgraphTable,
    graph: DependencyGraph,
    index: HashMap<String, ParamId>,
    /// Sink name → owning parameter
    sink_owner: HashMap<String, ParamId>,
}

impl ParameterGraph {
    /// Validate a table and compute its evaluation order
    ///
    /// # Errors
    /// - `DuplicateParameter` / `DuplicateSink` for repeated names
    /// - `UnknownParameter` for a dependency on an undeclared name
    /// - `Configuration` for a primary default outside its own domain
    /// - `CyclicDependency` if the dependencies are not a DAG
    pub fn build(table: FlowgraphTable) -> GraphResult<Self> {
        let mut index = HashMap::new();
        let mut sink_owner = HashMap::new();

        for (id, spec) in table.parameters.iter().enumerate() {
            if index.insert(spec.name.clone(), id).is_some() {
                return Err(GraphError::DuplicateParameter(spec.name.clone()));
            }
            for sink in &spec.sinks {
                if sink_owner.insert(sink.clone(), id).is_some() {
                    return Err(GraphError::DuplicateSink(sink.clone()));
                }
            }
            if let Some(default) = spec.default_value() {
                spec.domain
                    .validate(spec.kind, default)
                    .map_err(|reason| GraphError::Configuration {
                        parameter: spec.name.clone(),
                        reason: format!("default {}: {}", default, reason),
                    })?;
            }
        }

        let graph = DependencyGraph::build(&table.parameters)?;
        debug!(
            "Built parameter graph '{}': {} parameters, {} dependencies",
            table.name,
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            table,
            graph,
            index,
            sink_owner,
        })
    }

    pub fn name(&self) -> &str {
        &self.table.name
    }

    pub fn title(&self) -> &str {
        &self.table.title
    }

    pub fn table(&self) -> &FlowgraphTable {
        &self.table
    }

    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn id_of(&self, name: &str) -> Option<ParamId> {
        self.index.get(name).copied()
    }

    pub fn spec(&self, id: ParamId) -> &ParameterSpec {
        &self.table.parameters[id]
    }

    pub fn find(&self, name: &str) -> Option<&ParameterSpec> {
        self.id_of(name).map(|id| self.spec(id))
    }

    /// Parameters in evaluation order
    pub fn ordered_specs(&self) -> impl Iterator<Item = &ParameterSpec> + '_ {
        self.graph.evaluation_order().iter().map(|&id| self.spec(id))
    }

    /// Every declared sink, in table order
    pub fn sink_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.table
            .parameters
            .iter()
            .flat_map(|spec| spec.sinks.iter().map(String::as_str))
    }

    /// Names of the parameters recomputed when `name` changes (excluding itself)
    pub fn affected_by(&self, name: &str) -> GraphResult<Vec<&str>> {
        let id = self
            .id_of(name)
            .ok_or_else(|| GraphError::UnknownParameter(name.to_string()))?;
        Ok(self
            .graph
            .affected_order(id)
            .into_iter()
            .filter(|&p| p != id)
            .map(|p| self.spec(p).name.as_str())
            .collect())
    }

    /// Run a derived parameter's formula against `lookup`
    fn evaluate<'v>(
        &self,
        id: ParamId,
        lookup: impl Fn(ParamId) -> Option<&'v Value>,
    ) -> GraphResult<Value> {
        let spec = self.spec(id);
        let formula = match &spec.role {
            Role::Derived { formula, .. } => *formula,
            Role::Primary { .. } => {
                return Err(GraphError::Evaluation {
                    parameter: spec.name.clone(),
                    reason: "primary parameters have no formula".to_string(),
                })
            }
        };

        let mut entries = Vec::with_capacity(spec.dependencies().len());
        for dependency in spec.dependencies() {
            let value = self
                .id_of(dependency)
                .and_then(&lookup)
                .ok_or_else(|| GraphError::Evaluation {
                    parameter: spec.name.clone(),
                    reason: format!("dependency '{}' has no value", dependency),
                })?;
            entries.push((dependency.as_str(), value));
        }

        let value = formula(&Inputs::new(&spec.name, entries)).map_err(|reason| {
            GraphError::Evaluation {
                parameter: spec.name.clone(),
                reason,
            }
        })?;

        spec.domain
            .validate(spec.kind, &value)
            .map_err(|reason| GraphError::Evaluation {
                parameter: spec.name.clone(),
                reason: format!("produced {}: {}", value, reason),
            })
    }
}

/// Current values of one flow-graph instance
///
/// Created once from a configuration record; mutated only through [`set`].
/// Sinks are bound after construction and are never invoked by
/// `initialize` itself.
///
/// [`set`]: ParameterSet::set
pub struct ParameterSet {
    graph: Arc<ParameterGraph>,
    values: Vec<Value>,
    sinks: HashMap<String, Box<dyn Sink>>,
}

impl std::fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterSet")
            .field("values", &self.values)
            .field("sinks", &self.sinks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ParameterSet {
    /// Build the full set of values from a configuration record
    ///
    /// Every derived parameter is computed from scratch in evaluation order.
    /// Fails without side effects if the record omits a required primary,
    /// names an unknown or derived parameter, or carries an invalid value.
    pub fn initialize(graph: Arc<ParameterGraph>, config: &ConfigRecord) -> GraphResult<Self> {
        let mut configured: HashMap<ParamId, Value> = HashMap::new();

        for (name, entry) in config.iter() {
            let id = graph.id_of(name).ok_or_else(|| GraphError::Configuration {
                parameter: name.to_string(),
                reason: format!("not a parameter of '{}'", graph.name()),
            })?;
            let spec = graph.spec(id);
            if !spec.is_primary() {
                return Err(GraphError::Configuration {
                    parameter: name.to_string(),
                    reason: "derived parameters cannot be configured".to_string(),
                });
            }
            let value = spec
                .domain
                .validate(spec.kind, &Value::from(entry))
                .map_err(|reason| GraphError::Configuration {
                    parameter: name.to_string(),
                    reason,
                })?;
            configured.insert(id, value);
        }

        let order = graph.dependency_graph().evaluation_order();
        let mut slots: Vec<Option<Value>> = vec![None; order.len()];

        for &id in order {
            let spec = graph.spec(id);
            let value = if spec.is_primary() {
                match configured.remove(&id).or_else(|| spec.default_value().cloned()) {
                    Some(value) => value,
                    None => {
                        return Err(GraphError::Configuration {
                            parameter: spec.name.clone(),
                            reason: "required parameter is missing".to_string(),
                        })
                    }
                }
            } else {
                graph.evaluate(id, |d| slots[d].as_ref())?
            };
            debug!("{} = {}", spec.name, value);
            slots[id] = Some(value);
        }

        let values = slots
            .into_iter()
            .enumerate()
            .map(|(id, slot)| {
                slot.ok_or_else(|| GraphError::Evaluation {
                    parameter: graph.spec(id).name.clone(),
                    reason: "never evaluated".to_string(),
                })
            })
            .collect::<GraphResult<Vec<_>>>()?;

        info!(
            "Initialized '{}' with {} parameters",
            graph.name(),
            values.len()
        );

        Ok(Self {
            graph,
            values,
            sinks: HashMap::new(),
        })
    }

    pub fn graph(&self) -> &ParameterGraph {
        &self.graph
    }

    /// Current value of a parameter
    pub fn get(&self, name: &str) -> GraphResult<&Value> {
        self.value_of(name)
            .ok_or_else(|| GraphError::UnknownParameter(name.to_string()))
    }

    pub fn value_of(&self, name: &str) -> Option<&Value> {
        self.graph.id_of(name).map(|id| &self.values[id])
    }

    /// Numeric view of a parameter's current value
    pub fn real(&self, name: &str) -> GraphResult<f64> {
        let value = self.get(name)?;
        value.as_real().ok_or_else(|| GraphError::Evaluation {
            parameter: name.to_string(),
            reason: format!("{} value is not numeric", value.type_name()),
        })
    }

    /// All values, in evaluation order
    pub fn values(&self) -> Vec<(&str, &Value)> {
        self.graph
            .dependency_graph()
            .evaluation_order()
            .iter()
            .map(|&id| (self.graph.spec(id).name.as_str(), &self.values[id]))
            .collect()
    }

    /// Attach an external setter to a declared sink name
    ///
    /// Rebinding a name replaces the previous sink.
    pub fn bind(&mut self, sink_name: &str, sink: impl Sink + 'static) -> GraphResult<()> {
        if !self.graph.sink_owner.contains_key(sink_name) {
            return Err(GraphError::UnknownSink(sink_name.to_string()));
        }
        self.sinks.insert(sink_name.to_string(), Box::new(sink));
        Ok(())
    }

    /// Names of bound sinks, in table order
    pub fn bound_sinks(&self) -> Vec<&str> {
        self.graph
            .sink_names()
            .filter(|name| self.sinks.contains_key(*name))
            .collect()
    }

    /// Current primary values as a configuration record
    pub fn snapshot(&self) -> ConfigRecord {
        let mut record = ConfigRecord::new();
        for (id, spec) in self.graph.table().parameters.iter().enumerate() {
            if !spec.is_primary() {
                continue;
            }
            if let Ok(entry) = ConfigValue::try_from(&self.values[id]) {
                record.insert(&spec.name, entry);
            }
        }
        record
    }

    /// Push every current value to its bound sinks, in evaluation order
    ///
    /// This is the block-construction step; it is never run implicitly.
    /// Returns the number of sink calls made.
    pub fn apply_initial_sinks(&mut self) -> GraphResult<usize> {
        let order = self.graph.dependency_graph().evaluation_order().to_vec();
        let mut calls = 0;
        for id in order {
            calls += self.invoke_sinks(id)?;
        }
        Ok(calls)
    }

    /// Update a primary parameter and propagate the change
    ///
    /// Returns the parameters whose values changed, in evaluation order,
    /// starting with `name` itself. Setting a parameter to its current value
    /// returns an empty list and invokes no sinks.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> GraphResult<Vec<Change>> {
        let value = value.into();
        let id = self
            .graph
            .id_of(name)
            .ok_or_else(|| GraphError::UnknownParameter(name.to_string()))?;
        let spec = self.graph.spec(id);
        if !spec.is_primary() {
            return Err(GraphError::DerivedParameter(name.to_string()));
        }

        let value = spec
            .domain
            .validate(spec.kind, &value)
            .map_err(|reason| GraphError::InvalidValue {
                parameter: name.to_string(),
                value: value.clone(),
                reason,
            })?;

        if self.values[id] == value {
            debug!("{} unchanged at {}", name, value);
            return Ok(Vec::new());
        }

        let changed = self.stage(id, value)?;

        let mut changes = Vec::with_capacity(changed.len());
        for (changed_id, new_value) in &changed {
            self.values[*changed_id] = new_value.clone();
            changes.push(Change {
                parameter: self.graph.spec(*changed_id).name.clone(),
                value: new_value.clone(),
            });
        }

        let mut calls = 0;
        for (changed_id, _) in &changed {
            calls += self.invoke_sinks(*changed_id)?;
        }

        info!(
            "set {}: {} parameters changed, {} sink calls",
            name,
            changes.len(),
            calls
        );
        Ok(changes)
    }

    /// Recompute the descendants of `id` against a staging area
    ///
    /// Returns the changed parameters with their new values in evaluation
    /// order. Nothing in `self` is modified.
    fn stage(&self, id: ParamId, value: Value) -> GraphResult<Vec<(ParamId, Value)>> {
        let mut staged: HashMap<ParamId, Value> = HashMap::new();
        let mut dirty: HashSet<ParamId> = HashSet::new();
        let mut changed = vec![(id, value.clone())];
        staged.insert(id, value);
        dirty.insert(id);

        for p in self.graph.dependency_graph().affected_order(id) {
            if p == id {
                continue;
            }
            // Only inputs that actually changed can change the result
            if !self
                .graph
                .dependency_graph()
                .dependencies(p)
                .iter()
                .any(|d| dirty.contains(d))
            {
                continue;
            }

            let new_value = self
                .graph
                .evaluate(p, |d| staged.get(&d).or_else(|| self.values.get(d)))?;
            debug!("recomputed {} = {}", self.graph.spec(p).name, new_value);

            if new_value != self.values[p] {
                dirty.insert(p);
                changed.push((p, new_value.clone()));
                staged.insert(p, new_value);
            }
        }

        Ok(changed)
    }

    fn invoke_sinks(&mut self, id: ParamId) -> GraphResult<usize> {
        let spec = self.graph.spec(id);
        let value = &self.values[id];
        let mut calls = 0;
        for sink_name in &spec.sinks {
            if let Some(sink) = self.sinks.get_mut(sink_name) {
                debug!("{}({})", sink_name, value);
                sink.apply(value).map_err(|source| GraphError::Sink {
                    sink: sink_name.clone(),
                    parameter: spec.name.clone(),
                    source,
                })?;
                calls += 1;
            }
        }
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Kind;
    use crate::error::SinkError;
    use crate::sink::SinkRecorder;

    fn doubled(inputs: &Inputs<'_>) -> Result<Value, String> {
        Ok(Value::Real(inputs.real("x")? * 2.0))
    }

    fn sum(inputs: &Inputs<'_>) -> Result<Value, String> {
        Ok(Value::Real(inputs.real("y")? + inputs.real("z")?))
    }

    fn parity(inputs: &Inputs<'_>) -> Result<Value, String> {
        Ok(Value::Integer(inputs.real("x")? as i64 % 2))
    }

    fn reciprocal(inputs: &Inputs<'_>) -> Result<Value, String> {
        let x = inputs.real("x")?;
        if x == 0.0 {
            return Err("division by zero".to_string());
        }
        Ok(Value::Real(1.0 / x))
    }

    fn table() -> FlowgraphTable {
        FlowgraphTable::new("demo", "Demo")
            .parameter(
                ParameterSpec::primary("x", Kind::Real)
                    .with_range(-10.0, 10.0)
                    .with_sink("x.set"),
            )
            .parameter(ParameterSpec::primary("z", Kind::Real).with_default(1.0))
            .parameter(ParameterSpec::derived("y", Kind::Real, &["x"], doubled).with_sink("y.set"))
            .parameter(ParameterSpec::derived("w", Kind::Real, &["y", "z"], sum).with_sink("w.set"))
            .parameter(
                ParameterSpec::derived("odd", Kind::Integer, &["x"], parity).with_sink("odd.set"),
            )
            .parameter(ParameterSpec::derived("inv", Kind::Real, &["x"], reciprocal))
    }

    fn set_up() -> (ParameterSet, SinkRecorder) {
        let graph = Arc::new(ParameterGraph::build(table()).unwrap());
        let mut set = ParameterSet::initialize(graph, &ConfigRecord::new().with("x", 3.0)).unwrap();
        let recorder = SinkRecorder::new();
        for name in ["x.set", "y.set", "w.set", "odd.set"] {
            set.bind(name, recorder.sink(name)).unwrap();
        }
        (set, recorder)
    }

    #[test]
    fn test_initialize_computes_derived() {
        let (set, recorder) = set_up();
        assert_eq!(set.get("y").unwrap(), &Value::Real(6.0));
        assert_eq!(set.get("w").unwrap(), &Value::Real(7.0));
        assert_eq!(set.get("odd").unwrap(), &Value::Integer(1));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_set_propagates_in_order() {
        let (mut set, recorder) = set_up();
        let changes = set.set("x", 4.0).unwrap();
        let names: Vec<&str> = changes.iter().map(|c| c.parameter.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "w", "odd", "inv"]);

        let sinks: Vec<String> = recorder.calls().into_iter().map(|c| c.sink).collect();
        assert_eq!(sinks, vec!["x.set", "y.set", "w.set", "odd.set"]);
        assert_eq!(recorder.last("w.set"), Some(Value::Real(9.0)));
    }

    #[test]
    fn test_unchanged_derived_not_reported() {
        let (mut set, recorder) = set_up();
        // 3 → 5 keeps parity
        let changes = set.set("x", 5.0).unwrap();
        assert!(changes.iter().all(|c| c.parameter != "odd"));
        assert!(recorder.values_for("odd.set").is_empty());
    }

    #[test]
    fn test_repeat_set_is_noop() {
        let (mut set, recorder) = set_up();
        set.set("x", 4.0).unwrap();
        recorder.clear();
        assert!(set.set("x", 4.0).unwrap().is_empty());
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_invalid_value_leaves_state() {
        let (mut set, recorder) = set_up();
        let err = set.set("x", 11.0).unwrap_err();
        assert!(matches!(err, GraphError::InvalidValue { .. }));
        assert_eq!(set.get("x").unwrap(), &Value::Real(3.0));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_evaluation_failure_is_atomic() {
        let (mut set, recorder) = set_up();
        let err = set.set("x", 0.0).unwrap_err();
        assert!(matches!(err, GraphError::Evaluation { ref parameter, .. } if parameter == "inv"));
        assert_eq!(set.get("x").unwrap(), &Value::Real(3.0));
        assert_eq!(set.get("y").unwrap(), &Value::Real(6.0));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_set_rejects_derived_and_unknown() {
        let (mut set, _) = set_up();
        assert!(matches!(set.set("y", 1.0), Err(GraphError::DerivedParameter(_))));
        assert!(matches!(set.set("nope", 1.0), Err(GraphError::UnknownParameter(_))));
        assert!(matches!(set.get("nope"), Err(GraphError::UnknownParameter(_))));
    }

    #[test]
    fn test_initialize_errors() {
        let graph = Arc::new(ParameterGraph::build(table()).unwrap());
        let missing = ParameterSet::initialize(Arc::clone(&graph), &ConfigRecord::new());
        assert!(matches!(missing, Err(GraphError::Configuration { ref parameter, .. }) if parameter == "x"));

        let derived = ConfigRecord::new().with("x", 1.0).with("y", 2.0);
        assert!(matches!(
            ParameterSet::initialize(Arc::clone(&graph), &derived),
            Err(GraphError::Configuration { .. })
        ));

        let unknown = ConfigRecord::new().with("x", 1.0).with("q", 2.0);
        assert!(matches!(
            ParameterSet::initialize(Arc::clone(&graph), &unknown),
            Err(GraphError::Configuration { .. })
        ));

        let out_of_range = ConfigRecord::new().with("x", 50.0);
        assert!(matches!(
            ParameterSet::initialize(graph, &out_of_range),
            Err(GraphError::Configuration { .. })
        ));
    }

    #[test]
    fn test_sink_failure_propagates() {
        let (mut set, recorder) = set_up();
        set.bind("y.set", |_: &Value| -> Result<(), SinkError> { Err("unreachable".into()) })
            .unwrap();
        let err = set.set("x", 4.0).unwrap_err();
        assert!(matches!(err, GraphError::Sink { ref sink, .. } if sink == "y.set"));
        // Values were committed before the sinks ran
        assert_eq!(set.get("y").unwrap(), &Value::Real(8.0));
        // Sinks after the failing one were not invoked
        assert_eq!(recorder.values_for("x.set"), vec![Value::Real(4.0)]);
        assert!(recorder.values_for("w.set").is_empty());
    }

    #[test]
    fn test_bind_unknown_sink() {
        let (mut set, recorder) = set_up();
        assert!(matches!(
            set.bind("nope.set", recorder.sink("nope.set")),
            Err(GraphError::UnknownSink(_))
        ));
        assert_eq!(set.bound_sinks(), vec!["x.set", "y.set", "w.set", "odd.set"]);
    }

    #[test]
    fn test_apply_initial_sinks() {
        let (mut set, recorder) = set_up();
        assert_eq!(set.apply_initial_sinks().unwrap(), 4);
        assert_eq!(recorder.last("w.set"), Some(Value::Real(7.0)));
    }

    #[test]
    fn test_snapshot_has_only_primaries() {
        let (set, _) = set_up();
        let snapshot = set.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("x"), Some(&ConfigValue::Number(3.0)));
        assert_eq!(snapshot.get("z"), Some(&ConfigValue::Number(1.0)));
    }

    #[test]
    fn test_build_rejects_duplicates() {
        let dup = table().parameter(ParameterSpec::primary("x", Kind::Real));
        assert!(matches!(
            ParameterGraph::build(dup),
            Err(GraphError::DuplicateParameter(_))
        ));

        let dup_sink = table().parameter(ParameterSpec::primary("v", Kind::Real).with_sink("y.set"));
        assert!(matches!(
            ParameterGraph::build(dup_sink),
            Err(GraphError::DuplicateSink(_))
        ));

        let bad_default = table().parameter(
            ParameterSpec::primary("v", Kind::Real)
                .with_range(0.0, 1.0)
                .with_default(2.0),
        );
        assert!(matches!(
            ParameterGraph::build(bad_default),
            Err(GraphError::Configuration { .. })
        ));
    }

    #[test]
    fn test_affected_by() {
        let graph = ParameterGraph::build(table()).unwrap();
        assert_eq!(graph.affected_by("x").unwrap(), vec!["y", "w", "odd", "inv"]);
        assert_eq!(graph.affected_by("z").unwrap(), vec!["w"]);
    }
}
