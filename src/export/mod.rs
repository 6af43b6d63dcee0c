//! Exporters for an evaluated flow graph.

pub mod dot;
pub mod frame;
pub mod tables;

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::WorkCalendar;
use crate::graph::{FlowGraph, FlowNode, NodeId};
use crate::metadata::EstimateMetadata;
use crate::stats::AggregatedStatistics;

pub use dot::to_dot;
pub use frame::summary_frame;
pub use tables::{
    DistributionRecord, NodeSummaryRecord, distribution_records, save_distribution_csv,
    save_summary_csv, summary_records, write_distribution_csv, write_summary_csv,
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataframe conversion error: {0}")]
    Frame(#[from] PolarsError),
    #[error("flow graph `{0}` has not been evaluated")]
    NotEvaluated(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: NodeId,
    pub name: String,
    pub kind: String,
    pub generator: String,
    /// Enclosing subgraph inputs, then the node itself.
    pub path: Vec<NodeId>,
    pub generator_stats: Option<AggregatedStatistics>,
    pub cumulative_stats: Option<AggregatedStatistics>,
    pub estimated_completion: Option<NaiveDate>,
    pub critical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub critical: bool,
}

/// Serializable snapshot of a flow graph and, once evaluated, its results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub metadata: EstimateMetadata,
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
    pub critical_path: Vec<NodeId>,
    pub expected_duration: Option<f64>,
}

impl GraphExport {
    /// An unevaluated graph exports its topology only.
    pub fn from_flow(flow: &FlowGraph, calendar: Option<&WorkCalendar>) -> Self {
        let critical = flow.critical_path();
        let nodes = flow
            .nodes()
            .map(|node| {
                let result = flow.result(node.id);
                ExportNode {
                    id: node.id,
                    name: node.name.clone(),
                    kind: node.kind.label().to_string(),
                    generator: node.type_label(),
                    path: flow.absolute_path(node.id),
                    generator_stats: result.map(|r| r.generator_stats.clone()),
                    cumulative_stats: result.map(|r| r.cumulative_stats.clone()),
                    estimated_completion: estimated_completion(flow, node, calendar),
                    critical: critical.is_some_and(|path| path.contains_node(node.id)),
                }
            })
            .collect();
        let edges = flow
            .edges()
            .into_iter()
            .map(|(source, target)| ExportEdge {
                source,
                target,
                critical: critical.is_some_and(|path| path.contains_edge(source, target)),
            })
            .collect();

        Self {
            metadata: flow.metadata(),
            nodes,
            edges,
            critical_path: critical.map(|path| path.nodes.clone()).unwrap_or_default(),
            expected_duration: critical.map(|path| path.expected_duration),
        }
    }

    pub fn write_json<W: Write>(&self, writer: W) -> ExportResult<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Business-day completion date of a node's cumulative mean, for nodes
/// aggregated in workdays.
pub fn estimated_completion(
    flow: &FlowGraph,
    node: &FlowNode,
    calendar: Option<&WorkCalendar>,
) -> Option<NaiveDate> {
    if !node.aggregation.workdays {
        return None;
    }
    let calendar = calendar?;
    let result = flow.result(node.id)?;
    calendar.completion_date(flow.config().start_date, result.cumulative_stats.mean)
}

/// Completion date of the whole graph (root join), when aggregated in
/// workdays.
pub fn project_completion(flow: &FlowGraph, calendar: &WorkCalendar) -> Option<NaiveDate> {
    let output = flow.node(flow.output())?;
    estimated_completion(flow, output, Some(calendar))
}

pub(crate) fn ensure_evaluated(flow: &FlowGraph) -> ExportResult<()> {
    if flow.is_evaluated() {
        Ok(())
    } else {
        Err(ExportError::NotEvaluated(flow.name().to_string()))
    }
}

pub(crate) fn format_path(path: &[NodeId]) -> String {
    path.iter()
        .map(NodeId::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

pub fn save_graph_json<P: AsRef<Path>>(
    flow: &FlowGraph,
    calendar: Option<&WorkCalendar>,
    path: P,
) -> ExportResult<()> {
    let file = File::create(path)?;
    GraphExport::from_flow(flow, calendar).write_json(file)
}

pub fn load_graph_json<P: AsRef<Path>>(path: P) -> ExportResult<GraphExport> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}
