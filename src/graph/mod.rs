use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::generator::DurationGenerator;

pub mod flow_graph;
pub mod subgraph;

pub use flow_graph::FlowGraph;
pub use subgraph::{Subgraph, SubgraphBuilder};

/// Identity of a node in the shared arena. Nodes are never removed, so the
/// identity doubles as the arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn node_index(self) -> NodeIndex {
        NodeIndex::new(self.0)
    }
}

impl From<NodeIndex> for NodeId {
    fn from(value: NodeIndex) -> Self {
        Self(value.index())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubgraphId(pub usize);

impl fmt::Display for SubgraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a node's cumulative duration is presented to readers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationOptions {
    /// Translate the cumulative mean into a business-day completion date.
    #[serde(default)]
    pub workdays: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Graph root. Holds the number of Monte Carlo iterations.
    Start { run_count: u64 },
    /// Subgraph entry; forwards its single predecessor unchanged.
    PassThrough,
    Generator(DurationGenerator),
    /// Subgraph exit; element-wise maximum over all predecessors.
    Join,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Start { .. } => "start",
            NodeKind::PassThrough => "pass_through",
            NodeKind::Generator(_) => "generator",
            NodeKind::Join => "join",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowNode {
    pub id: NodeId,
    pub name: String,
    /// Enclosing subgraphs, outermost first.
    pub path: Vec<SubgraphId>,
    pub aggregation: AggregationOptions,
    pub kind: NodeKind,
}

impl FlowNode {
    pub fn generator(&self) -> Option<&DurationGenerator> {
        match &self.kind {
            NodeKind::Generator(generator) => Some(generator),
            _ => None,
        }
    }

    /// Generator label, or the structural role for non-generator nodes.
    pub fn type_label(&self) -> String {
        match &self.kind {
            NodeKind::Generator(generator) => generator.to_string(),
            NodeKind::Join => DurationGenerator::UpperBound.to_string(),
            other => other.label().to_string(),
        }
    }
}
