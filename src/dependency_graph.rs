//! Dependency graph analysis for flow-graph parameters
//!
//! This module analyzes a declarative parameter table to determine:
//! - Evaluation order (stable topological sort)
//! - Cycle detection (invalid tables)
//! - The sub-graph affected by a change to one parameter

use crate::error::{GraphError, GraphResult};
use crate::parameter::ParameterSpec;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Position of a parameter in its table
pub type ParamId = usize;

/// Represents the parameter dependency graph
///
/// # Graph Structure
/// - Nodes: Parameters, identified by declaration index
/// - Edges: Dependencies (value flows from dependency → derived parameter)
///
/// # Usage
/// ```ignore
/// let graph = DependencyGraph::build(&table.parameters)?;
/// let order = graph.evaluation_order();        // Whole table
/// let affected = graph.affected_order(id);     // Only what `id` feeds
/// ```
pub struct DependencyGraph {
    /// Directed acyclic graph of parameter dependencies
    graph: DiGraph<ParamId, ()>,

    /// Map ParamId → NodeIndex for graph operations
    node_map: HashMap<ParamId, NodeIndex>,

    /// Stable topological order, computed once at build time
    order: Vec<ParamId>,

    /// Position of each parameter in `order`
    rank: Vec<usize>,
}

impl DependencyGraph {
    /// Build dependency graph from parameter specs
    ///
    /// # Errors
    /// - `UnknownParameter` if a dependency names an undeclared parameter
    /// - `CyclicDependency` if the declared dependencies are not a DAG
    pub fn build(specs: &[ParameterSpec]) -> GraphResult<Self> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut by_name: HashMap<&str, ParamId> = HashMap::new();

        for (id, spec) in specs.iter().enumerate() {
            let idx = graph.add_node(id);
            node_map.insert(id, idx);
            by_name.insert(spec.name.as_str(), id);
        }

        for (id, spec) in specs.iter().enumerate() {
            let dependent_idx = node_map[&id];
            let mut seen = HashSet::new();

            for dependency in spec.dependencies() {
                let input_id = *by_name
                    .get(dependency.as_str())
                    .ok_or_else(|| GraphError::UnknownParameter(dependency.clone()))?;
                // Repeated declarations collapse to one edge
                if seen.insert(input_id) {
                    graph.add_edge(node_map[&input_id], dependent_idx, ());
                }
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(GraphError::CyclicDependency {
                parameter: specs[graph[cycle.node_id()]].name.clone(),
            });
        }

        let order = stable_order(&graph);
        let mut rank = vec![0; order.len()];
        for (position, &id) in order.iter().enumerate() {
            rank[id] = position;
        }

        Ok(Self {
            graph,
            node_map,
            order,
            rank,
        })
    }

    /// Topological order over the whole table
    ///
    /// Every parameter appears after all of its dependencies. Among
    /// parameters that are ready at the same time, the one declared first
    /// comes first, so the order is deterministic.
    pub fn evaluation_order(&self) -> &[ParamId] {
        &self.order
    }

    /// Position of a parameter in `evaluation_order`
    pub fn rank(&self, id: ParamId) -> Option<usize> {
        self.rank.get(id).copied()
    }

    /// All parameters reachable from `id`, including `id` itself
    pub fn descendants(&self, id: ParamId) -> HashSet<ParamId> {
        let mut reached = HashSet::new();
        if let Some(&start) = self.node_map.get(&id) {
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(idx) = dfs.next(&self.graph) {
                reached.insert(self.graph[idx]);
            }
        }
        reached
    }

    /// The descendants of `id` (and `id` itself) in evaluation order
    ///
    /// This is the sub-graph that has to be recomputed after `id` changes.
    pub fn affected_order(&self, id: ParamId) -> Vec<ParamId> {
        let reached = self.descendants(id);
        self.order
            .iter()
            .copied()
            .filter(|p| reached.contains(p))
            .collect()
    }

    /// Get all direct dependencies of a parameter
    pub fn dependencies(&self, id: ParamId) -> Vec<ParamId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Get all parameters that directly depend on this one
    pub fn dependents(&self, id: ParamId) -> Vec<ParamId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: ParamId, direction: Direction) -> Vec<ParamId> {
        if let Some(&node_idx) = self.node_map.get(&id) {
            let mut ids: Vec<ParamId> = self
                .graph
                .neighbors_directed(node_idx, direction)
                .map(|idx| self.graph[idx])
                .collect();
            ids.sort_unstable();
            ids
        } else {
            vec![]
        }
    }

    /// Get number of parameters in graph
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get number of edges (dependencies) in graph
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Get all source parameters (those with no dependencies)
    ///
    /// Every primary parameter is a source; so is a derived constant.
    pub fn source_nodes(&self) -> Vec<ParamId> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx])
            .collect()
    }
}

/// Kahn's algorithm with ties broken by declaration index
fn stable_order(graph: &DiGraph<ParamId, ()>) -> Vec<ParamId> {
    let mut in_degree: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|idx| (idx, graph.neighbors_directed(idx, Direction::Incoming).count()))
        .collect();

    let mut ready: BinaryHeap<Reverse<(ParamId, NodeIndex)>> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(&idx, _)| Reverse((graph[idx], idx)))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(Reverse((id, idx))) = ready.pop() {
        order.push(id);
        for next in graph.neighbors_directed(idx, Direction::Outgoing) {
            if let Some(degree) = in_degree.get_mut(&next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse((graph[next], next)));
                }
            }
        }
    }

    order
}
