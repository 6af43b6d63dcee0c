use petgraph::Direction;
use petgraph::algo::toposort;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use super::results::ResultsTable;
use crate::error::{FlowError, FlowResult};
use crate::generator::{DurationGenerator, GenerationResult};
use crate::graph::{FlowGraph, FlowNode, NodeId, NodeKind};

/// Topological Monte Carlo pass over a flow graph.
///
/// Nodes are visited in a fixed topological order and every generator draws
/// from one seeded stream, so the same graph and seed always produce the
/// same samples.
pub struct Evaluation<'a> {
    graph: &'a FlowGraph,
    seed: u64,
}

impl<'a> Evaluation<'a> {
    pub fn new(graph: &'a FlowGraph, seed: u64) -> Self {
        Self { graph, seed }
    }

    pub fn execute(&self) -> FlowResult<ResultsTable> {
        let topology = self.graph.topology();
        let order = toposort(topology, None).map_err(|cycle| {
            FlowError::structural(cycle.node_id().into(), "cycle detected in flow graph")
        })?;

        let percentiles = self.graph.percentiles();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut results = ResultsTable::default();

        for node_ix in order {
            let node = &topology[node_ix];
            let prior = self.predecessor_results(node, &results)?;

            let result = match &node.kind {
                NodeKind::Start { run_count } => Self::start_result(node, *run_count, percentiles)?,
                NodeKind::PassThrough => match prior.as_slice() {
                    [single] => (*single).clone(),
                    _ => {
                        return Err(FlowError::structural(
                            node.id,
                            format!(
                                "pass-through `{}` requires exactly one predecessor, found {}",
                                node.name,
                                prior.len()
                            ),
                        ));
                    }
                },
                NodeKind::Generator(generator) => {
                    generator.generate(node.id, &prior, percentiles, &mut rng)?
                }
                NodeKind::Join => {
                    let promoted: Vec<GenerationResult> =
                        prior.iter().map(|result| result.promote_cumulative()).collect();
                    let promoted_refs: Vec<&GenerationResult> = promoted.iter().collect();
                    DurationGenerator::UpperBound.generate(
                        node.id,
                        &promoted_refs,
                        percentiles,
                        &mut rng,
                    )?
                }
            };

            debug!(
                node = %node.id,
                name = %node.name,
                kind = node.kind.label(),
                mean = result.generator_stats.mean,
                cumulative_mean = result.cumulative_stats.mean,
                "evaluated node"
            );
            results.insert(node.id, result)?;
        }

        Ok(results)
    }

    fn start_result(node: &FlowNode, run_count: u64, percentiles: &[f64]) -> FlowResult<GenerationResult> {
        if run_count == 0 {
            return Err(FlowError::Config(format!(
                "run count for `{}` (node {}) must be greater than zero",
                node.name, node.id
            )));
        }
        let zeros = vec![0.0; run_count as usize];
        Ok(GenerationResult::from_parts(zeros.clone(), zeros, percentiles))
    }

    /// Results of all direct predecessors, ordered by node identity.
    fn predecessor_results<'r>(
        &self,
        node: &FlowNode,
        results: &'r ResultsTable,
    ) -> FlowResult<Vec<&'r GenerationResult>> {
        if let NodeKind::Start { .. } = node.kind {
            return Ok(Vec::new());
        }
        let mut predecessors: Vec<NodeId> = self
            .graph
            .topology()
            .neighbors_directed(node.id.node_index(), Direction::Incoming)
            .map(NodeId::from)
            .collect();
        predecessors.sort();
        predecessors.dedup();

        predecessors
            .into_iter()
            .map(|pred| {
                results.get(pred).ok_or_else(|| {
                    FlowError::structural(
                        node.id,
                        format!("no result available for predecessor {pred}"),
                    )
                })
            })
            .collect()
    }
}
