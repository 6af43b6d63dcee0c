use serde::{Deserialize, Serialize};

use super::{AggregationOptions, FlowGraph, NodeId, SubgraphId};
use crate::error::FlowResult;
use crate::generator::DurationGenerator;

/// A named scope within the shared flow graph. Holds identities only; the
/// nodes themselves live in the [`FlowGraph`] arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    pub id: SubgraphId,
    pub name: String,
    pub input: NodeId,
    pub output: NodeId,
    /// Serial chain in declaration order.
    pub serial: Vec<NodeId>,
    pub parallel: Vec<NodeId>,
    pub children: Vec<SubgraphId>,
    /// Enclosing subgraphs, outermost first. Empty for the root.
    pub ancestors: Vec<SubgraphId>,
    pub aggregation: AggregationOptions,
}

impl Subgraph {
    /// Path handed to nodes created inside this subgraph.
    pub(crate) fn node_path(&self) -> Vec<SubgraphId> {
        let mut path = self.ancestors.clone();
        path.push(self.id);
        path
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}

/// Mutable view over one subgraph of a [`FlowGraph`].
pub struct SubgraphBuilder<'g> {
    graph: &'g mut FlowGraph,
    id: SubgraphId,
}

impl<'g> SubgraphBuilder<'g> {
    pub(crate) fn new(graph: &'g mut FlowGraph, id: SubgraphId) -> Self {
        Self { graph, id }
    }

    pub fn id(&self) -> SubgraphId {
        self.id
    }

    pub fn add_serial_node(
        &mut self,
        name: impl Into<String>,
        generator: DurationGenerator,
    ) -> FlowResult<NodeId> {
        self.graph.add_serial_node(self.id, name, generator)
    }

    pub fn add_parallel_node(
        &mut self,
        name: impl Into<String>,
        generator: DurationGenerator,
    ) -> FlowResult<NodeId> {
        self.graph.add_parallel_node(self.id, name, generator)
    }

    /// Parses `expression` and appends the generator to the serial chain.
    pub fn add_serial(&mut self, name: impl Into<String>, expression: &str) -> FlowResult<NodeId> {
        let generator = DurationGenerator::parse(expression)?;
        self.add_serial_node(name, generator)
    }

    pub fn add_parallel(&mut self, name: impl Into<String>, expression: &str) -> FlowResult<NodeId> {
        let generator = DurationGenerator::parse(expression)?;
        self.add_parallel_node(name, generator)
    }

    /// Creates a nested subgraph and returns a view over it.
    pub fn add_subgraph(&mut self, name: impl Into<String>) -> FlowResult<SubgraphBuilder<'_>> {
        let child = self.graph.add_subgraph(self.id, name)?;
        Ok(SubgraphBuilder::new(self.graph, child))
    }
}
