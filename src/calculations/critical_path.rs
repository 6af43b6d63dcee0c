use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::bellman_ford;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::results::ResultsTable;
use crate::error::{FlowError, FlowResult};
use crate::graph::{FlowGraph, NodeId, NodeKind};

/// Longest expected path from the Start node to one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePath {
    pub nodes: Vec<NodeId>,
    /// Sum of generator means along the path.
    pub expected_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPath {
    /// Start → root join, in order.
    pub nodes: Vec<NodeId>,
    pub edges: BTreeSet<(NodeId, NodeId)>,
    pub expected_duration: f64,
    /// Longest path to every node reachable from Start.
    pub paths: BTreeMap<NodeId, NodePath>,
}

impl CriticalPath {
    pub fn contains_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.edges.contains(&(from, to))
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}

/// Critical-path search over an evaluated flow graph.
///
/// Each edge is weighted by the negated generator mean of its source
/// (structural nodes weigh 0), so the shortest path found by Bellman-Ford
/// is the path of maximal expected duration.
pub struct CriticalPathSearch<'a> {
    graph: &'a FlowGraph,
    results: &'a ResultsTable,
}

impl<'a> CriticalPathSearch<'a> {
    pub fn new(graph: &'a FlowGraph, results: &'a ResultsTable) -> Self {
        Self { graph, results }
    }

    fn weighted_topology(&self) -> FlowResult<DiGraph<NodeId, f64>> {
        let topology = self.graph.topology();
        let mut weighted = DiGraph::with_capacity(topology.node_count(), topology.edge_count());
        for node_ix in topology.node_indices() {
            weighted.add_node(topology[node_ix].id);
        }
        for edge in topology.edge_references() {
            let source = &topology[edge.source()];
            let weight = match source.kind {
                NodeKind::Generator(_) => {
                    let result = self.results.get(source.id).ok_or_else(|| {
                        FlowError::structural(source.id, "node has not been evaluated")
                    })?;
                    -result.generator_stats.mean
                }
                _ => 0.0,
            };
            weighted.add_edge(edge.source(), edge.target(), weight);
        }
        Ok(weighted)
    }

    pub fn execute(&self) -> FlowResult<CriticalPath> {
        let weighted = self.weighted_topology()?;
        let start = self.graph.start();
        let paths = bellman_ford(&weighted, start.node_index()).map_err(|_| {
            FlowError::structural(
                start,
                "negative-weight cycle detected during critical path search",
            )
        })?;

        let mut node_paths = BTreeMap::new();
        for node_ix in weighted.node_indices() {
            let distance = paths.distances[node_ix.index()];
            if distance.is_infinite() {
                continue;
            }
            let nodes = Self::trace(&paths.predecessors, node_ix, start.node_index())
                .ok_or_else(|| {
                    FlowError::structural(node_ix.into(), "predecessor chain does not reach start")
                })?;
            let path = NodePath {
                nodes,
                expected_duration: -distance,
            };
            debug!(
                source = %start,
                end = %NodeId::from(node_ix),
                weight = distance,
                path = ?path.nodes,
                "longest expected path"
            );
            node_paths.insert(NodeId::from(node_ix), path);
        }

        let output = self.graph.output();
        let canonical = node_paths.get(&output).cloned().ok_or_else(|| {
            FlowError::structural(output, "root join is not reachable from start")
        })?;
        let edges = canonical
            .nodes
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();

        Ok(CriticalPath {
            nodes: canonical.nodes,
            edges,
            expected_duration: canonical.expected_duration,
            paths: node_paths,
        })
    }

    /// Walks the predecessor chain back to `start`. Bounded by the node
    /// count so a malformed chain cannot loop.
    fn trace(
        predecessors: &[Option<NodeIndex>],
        end: NodeIndex,
        start: NodeIndex,
    ) -> Option<Vec<NodeId>> {
        let mut nodes = vec![NodeId::from(end)];
        let mut current = end;
        while current != start {
            if nodes.len() > predecessors.len() {
                return None;
            }
            current = predecessors.get(current.index()).copied().flatten()?;
            nodes.push(NodeId::from(current));
        }
        nodes.reverse();
        Some(nodes)
    }
}
