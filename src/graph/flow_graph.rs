use chrono::{Local, NaiveDateTime};
use petgraph::Direction;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use tracing::info;

use super::{AggregationOptions, FlowNode, NodeId, NodeKind, Subgraph, SubgraphBuilder, SubgraphId};
use crate::calculations::critical_path::{CriticalPath, CriticalPathSearch};
use crate::calculations::evaluation::Evaluation;
use crate::calculations::results::ResultsTable;
use crate::config::EvaluationConfig;
use crate::error::{FlowError, FlowResult};
use crate::generator::{DurationGenerator, GenerationResult};
use crate::metadata::EstimateMetadata;

pub const DEFAULT_PERCENTILES: [f64; 2] = [50.0, 95.0];

const JOIN_NODE_NAME: &str = "Summary";

/// Root of an activity flow: the Start node, the root subgraph, and every
/// nested subgraph, all sharing one node arena.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    name: String,
    percentiles: Vec<f64>,
    graph: DiGraph<FlowNode, ()>,
    subgraphs: Vec<Subgraph>,
    start: NodeId,
    config: EvaluationConfig,
    results: ResultsTable,
    critical_path: Option<CriticalPath>,
    evaluated_at: Option<NaiveDateTime>,
}

impl FlowGraph {
    pub fn new(name: impl Into<String>, run_count: u64) -> Self {
        Self::with_aggregation(name, run_count, AggregationOptions::default())
    }

    /// Creates a graph whose root subgraph (and therefore every node added
    /// later) carries `aggregation`.
    pub fn with_aggregation(
        name: impl Into<String>,
        run_count: u64,
        aggregation: AggregationOptions,
    ) -> Self {
        let name = name.into();
        let mut flow = Self {
            name: name.clone(),
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            graph: DiGraph::new(),
            subgraphs: Vec::new(),
            start: NodeId(0),
            config: EvaluationConfig::default(),
            results: ResultsTable::default(),
            critical_path: None,
            evaluated_at: None,
        };
        flow.start = flow.push_node(name.clone(), Vec::new(), aggregation, NodeKind::Start { run_count });
        let root = flow.create_subgraph(name, None, aggregation);
        let root_input = flow.subgraphs[root.0].input;
        flow.link(flow.start, root_input);
        flow
    }

    pub fn with_percentiles(mut self, percentiles: Vec<f64>) -> Self {
        self.percentiles = percentiles;
        self
    }

    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_percentiles(&mut self, percentiles: Vec<f64>) {
        self.percentiles = percentiles;
    }

    pub fn set_config(&mut self, config: EvaluationConfig) {
        self.config = config;
    }

    fn push_node(
        &mut self,
        name: String,
        path: Vec<SubgraphId>,
        aggregation: AggregationOptions,
        kind: NodeKind,
    ) -> NodeId {
        let id = NodeId(self.graph.node_count());
        let index = self.graph.add_node(FlowNode {
            id,
            name,
            path,
            aggregation,
            kind,
        });
        debug_assert_eq!(index.index(), id.0);
        id
    }

    fn create_subgraph(
        &mut self,
        name: String,
        parent: Option<SubgraphId>,
        aggregation: AggregationOptions,
    ) -> SubgraphId {
        let id = SubgraphId(self.subgraphs.len());
        let mut ancestors = match parent {
            Some(parent) => self.subgraphs[parent.0].ancestors.clone(),
            None => Vec::new(),
        };
        if let Some(parent) = parent {
            ancestors.push(parent);
        }
        let mut node_path = ancestors.clone();
        node_path.push(id);

        let input = self.push_node(name.clone(), node_path.clone(), aggregation, NodeKind::PassThrough);
        let output = self.push_node(JOIN_NODE_NAME.to_string(), node_path, aggregation, NodeKind::Join);
        self.subgraphs.push(Subgraph {
            id,
            name,
            input,
            output,
            serial: Vec::new(),
            parallel: Vec::new(),
            children: Vec::new(),
            ancestors,
            aggregation,
        });
        id
    }

    /// Adds a directed edge; a duplicate edge is ignored.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> FlowResult<()> {
        self.ensure_mutable()?;
        for id in [from, to] {
            if self.node(id).is_none() {
                return Err(FlowError::structural(id, "unknown node"));
            }
        }
        self.link(from, to);
        Ok(())
    }

    fn link(&mut self, from: NodeId, to: NodeId) {
        self.graph.update_edge(from.node_index(), to.node_index(), ());
    }

    fn disconnect(&mut self, from: NodeId, to: NodeId) {
        if let Some(edge) = self.graph.find_edge(from.node_index(), to.node_index()) {
            self.graph.remove_edge(edge);
        }
    }

    /// Composition is closed once results exist.
    fn ensure_mutable(&self) -> FlowResult<()> {
        if self.evaluated_at.is_some() {
            return Err(FlowError::structural(
                self.start,
                "flow graph cannot change after evaluation",
            ));
        }
        Ok(())
    }

    fn scope(&self, id: SubgraphId) -> FlowResult<&Subgraph> {
        self.subgraphs
            .get(id.0)
            .ok_or_else(|| FlowError::structural(self.start, format!("unknown subgraph {id}")))
    }

    /// Appends a generator to the subgraph's serial chain, rewiring the
    /// previous tail (or the subgraph input) to it and it to the join.
    pub fn add_serial_node(
        &mut self,
        subgraph: SubgraphId,
        name: impl Into<String>,
        generator: DurationGenerator,
    ) -> FlowResult<NodeId> {
        self.ensure_mutable()?;
        let scope = self.scope(subgraph)?;
        let (path, aggregation, input, output) =
            (scope.node_path(), scope.aggregation, scope.input, scope.output);
        let tail = scope.serial.last().copied();

        let node = self.push_node(name.into(), path, aggregation, NodeKind::Generator(generator));
        match tail {
            Some(tail) => {
                self.disconnect(tail, output);
                self.link(tail, node);
            }
            None => self.link(input, node),
        }
        self.link(node, output);
        self.subgraphs[subgraph.0].serial.push(node);
        Ok(node)
    }

    /// Links a generator between the subgraph input and its join,
    /// independent of the serial chain.
    pub fn add_parallel_node(
        &mut self,
        subgraph: SubgraphId,
        name: impl Into<String>,
        generator: DurationGenerator,
    ) -> FlowResult<NodeId> {
        self.ensure_mutable()?;
        let scope = self.scope(subgraph)?;
        let (path, aggregation, input, output) =
            (scope.node_path(), scope.aggregation, scope.input, scope.output);

        let node = self.push_node(name.into(), path, aggregation, NodeKind::Generator(generator));
        self.link(input, node);
        self.link(node, output);
        self.subgraphs[subgraph.0].parallel.push(node);
        Ok(node)
    }

    /// Nests a new subgraph: parent input feeds the child input, child join
    /// feeds the parent join.
    pub fn add_subgraph(
        &mut self,
        parent: SubgraphId,
        name: impl Into<String>,
    ) -> FlowResult<SubgraphId> {
        self.ensure_mutable()?;
        let scope = self.scope(parent)?;
        let (aggregation, parent_input, parent_output) =
            (scope.aggregation, scope.input, scope.output);
        let child = self.create_subgraph(name.into(), Some(parent), aggregation);
        let (child_input, child_output) = {
            let scope = &self.subgraphs[child.0];
            (scope.input, scope.output)
        };
        self.link(parent_input, child_input);
        self.link(child_output, parent_output);
        self.subgraphs[parent.0].children.push(child);
        Ok(child)
    }

    pub fn root(&self) -> SubgraphId {
        SubgraphId(0)
    }

    pub fn root_mut(&mut self) -> SubgraphBuilder<'_> {
        let root = self.root();
        SubgraphBuilder::new(self, root)
    }

    pub fn subgraph_mut(&mut self, id: SubgraphId) -> Option<SubgraphBuilder<'_>> {
        if id.0 < self.subgraphs.len() {
            Some(SubgraphBuilder::new(self, id))
        } else {
            None
        }
    }

    /// Runs the Monte Carlo evaluation and the critical-path search.
    ///
    /// A graph is evaluated at most once.
    pub fn evaluate(&mut self) -> FlowResult<()> {
        if self.evaluated_at.is_some() {
            return Err(FlowError::structural(
                self.start,
                "flow graph has already been evaluated",
            ));
        }
        let results = Evaluation::new(self, self.config.seed).execute()?;
        let critical_path = CriticalPathSearch::new(self, &results).execute()?;
        info!(
            graph = %self.name,
            nodes = self.graph.node_count(),
            runs = self.run_count(),
            expected_duration = critical_path.expected_duration,
            "flow graph evaluated"
        );
        self.results = results;
        self.critical_path = Some(critical_path);
        self.evaluated_at = Some(Local::now().naive_local());
        Ok(())
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated_at.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn run_count(&self) -> u64 {
        match self.graph[self.start.node_index()].kind {
            NodeKind::Start { run_count } => run_count,
            _ => 0,
        }
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    /// Join node of the root subgraph; its cumulative values are the
    /// project completion distribution.
    pub fn output(&self) -> NodeId {
        self.subgraphs[0].output
    }

    pub fn node(&self, id: NodeId) -> Option<&FlowNode> {
        self.graph.node_weight(id.node_index())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> + '_ {
        self.graph.node_weights()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every edge as (source, target), sorted.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges: Vec<(NodeId, NodeId)> = self
            .graph
            .edge_references()
            .map(|edge| (edge.source().into(), edge.target().into()))
            .collect();
        edges.sort();
        edges
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.graph.contains_edge(from.node_index(), to.node_index())
    }

    /// Direct predecessors, sorted by identity.
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .graph
            .neighbors_directed(id.node_index(), direction)
            .map(NodeId::from)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn subgraph(&self, id: SubgraphId) -> Option<&Subgraph> {
        self.subgraphs.get(id.0)
    }

    pub fn subgraphs(&self) -> &[Subgraph] {
        &self.subgraphs
    }

    /// Input node identities of every enclosing subgraph, followed by the
    /// node itself.
    pub fn absolute_path(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let mut path: Vec<NodeId> = node
            .path
            .iter()
            .filter_map(|sub| self.subgraphs.get(sub.0))
            .map(|sub| sub.input)
            .collect();
        if path.last() != Some(&id) {
            path.push(id);
        }
        path
    }

    pub fn results(&self) -> &ResultsTable {
        &self.results
    }

    pub fn result(&self, id: NodeId) -> Option<&GenerationResult> {
        self.results.get(id)
    }

    pub fn critical_path(&self) -> Option<&CriticalPath> {
        self.critical_path.as_ref()
    }

    pub fn metadata(&self) -> EstimateMetadata {
        EstimateMetadata {
            name: self.name.clone(),
            run_count: self.run_count(),
            percentiles: self.percentiles.clone(),
            workdays: self.subgraphs[0].aggregation.workdays,
            seed: self.config.seed,
            start_date: self.config.start_date,
            created: self.evaluated_at,
        }
    }

    pub(crate) fn topology(&self) -> &DiGraph<FlowNode, ()> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(value: f64) -> DurationGenerator {
        DurationGenerator::Fixed { value }
    }

    #[test]
    fn new_graph_links_start_to_root_input() {
        let flow = FlowGraph::new("demo", 10);
        let root = flow.subgraph(flow.root()).unwrap();
        assert_eq!(flow.node_count(), 3);
        assert!(flow.has_edge(flow.start(), root.input));
        assert_eq!(flow.successors(root.input), Vec::<NodeId>::new());
    }

    #[test]
    fn serial_nodes_replace_tail_to_join_edge() {
        let mut flow = FlowGraph::new("demo", 10);
        let root = flow.root();
        let a = flow.add_serial_node(root, "a", fixed(1.0)).unwrap();
        let b = flow.add_serial_node(root, "b", fixed(2.0)).unwrap();
        let output = flow.output();

        assert!(flow.has_edge(a, b));
        assert!(!flow.has_edge(a, output));
        assert!(flow.has_edge(b, output));
        assert_eq!(flow.subgraph(root).unwrap().serial, vec![a, b]);
    }

    #[test]
    fn absolute_path_lists_enclosing_inputs() {
        let mut flow = FlowGraph::new("demo", 10);
        let root = flow.root();
        let child = flow.add_subgraph(root, "child").unwrap();
        let node = flow.add_serial_node(child, "leaf", fixed(1.0)).unwrap();

        let root_input = flow.subgraph(root).unwrap().input;
        let child_input = flow.subgraph(child).unwrap().input;
        assert_eq!(flow.absolute_path(node), vec![root_input, child_input, node]);
        assert_eq!(flow.absolute_path(child_input), vec![root_input, child_input]);
    }

    #[test]
    fn composition_is_rejected_after_evaluation() {
        let mut flow = FlowGraph::new("demo", 10);
        let root = flow.root();
        let a = flow.add_serial_node(root, "a", fixed(5.0)).unwrap();
        flow.evaluate().unwrap();
        let edges = flow.edges();
        let nodes = flow.node_count();

        assert!(matches!(
            flow.add_serial_node(root, "late", fixed(100.0)),
            Err(FlowError::Structural { .. })
        ));
        assert!(matches!(
            flow.add_parallel_node(root, "late", fixed(100.0)),
            Err(FlowError::Structural { .. })
        ));
        assert!(matches!(flow.add_subgraph(root, "late"), Err(FlowError::Structural { .. })));
        assert!(matches!(flow.connect(a, flow.output()), Err(FlowError::Structural { .. })));

        assert_eq!(flow.edges(), edges);
        assert_eq!(flow.node_count(), nodes);
        let critical = flow.critical_path().unwrap();
        assert!(critical.edges.iter().all(|(from, to)| flow.has_edge(*from, *to)));
    }

    #[test]
    fn unknown_ids_are_structural_errors() {
        let mut flow = FlowGraph::new("demo", 10);
        let missing = SubgraphId(7);

        assert!(matches!(
            flow.add_serial_node(missing, "x", fixed(1.0)),
            Err(FlowError::Structural { .. })
        ));
        assert!(matches!(
            flow.add_parallel_node(missing, "x", fixed(1.0)),
            Err(FlowError::Structural { .. })
        ));
        assert!(matches!(flow.add_subgraph(missing, "x"), Err(FlowError::Structural { .. })));
        match flow.connect(flow.start(), NodeId(42)) {
            Err(FlowError::Structural { node, .. }) => assert_eq!(node, NodeId(42)),
            other => panic!("expected structural error, got {other:?}"),
        }
        assert_eq!(flow.node_count(), 3);
        assert_eq!(flow.subgraphs().len(), 1);
    }
}
