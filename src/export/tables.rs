use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ExportResult, ensure_evaluated, estimated_completion, format_path};
use crate::calendar::WorkCalendar;
use crate::graph::FlowGraph;
use crate::stats::{AggregatedStatistics, cdf, histogram};

/// One CSV row per node. Percentiles are flattened into `p50=..;p95=..`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummaryRecord {
    pub id: usize,
    pub name: String,
    pub kind: String,
    pub generator: String,
    pub path: String,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub percentiles: String,
    pub cumulative_mean: f64,
    pub cumulative_median: f64,
    pub cumulative_std_dev: f64,
    pub cumulative_percentiles: String,
    pub critical: bool,
    pub estimated_completion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub bin_lower: f64,
    pub bin_upper: f64,
    pub count: usize,
    pub density: f64,
    pub cumulative_fraction: f64,
}

fn format_percentiles(stats: &AggregatedStatistics) -> String {
    stats
        .percentiles
        .iter()
        .map(|p| format!("p{}={}", p.percentile, p.value))
        .collect::<Vec<_>>()
        .join(";")
}

pub fn summary_records(
    flow: &FlowGraph,
    calendar: Option<&WorkCalendar>,
) -> ExportResult<Vec<NodeSummaryRecord>> {
    ensure_evaluated(flow)?;
    let critical = flow.critical_path();
    let mut records = Vec::with_capacity(flow.node_count());
    for node in flow.nodes() {
        let Some(result) = flow.result(node.id) else {
            continue;
        };
        let raw = &result.generator_stats;
        let cumulative = &result.cumulative_stats;
        records.push(NodeSummaryRecord {
            id: node.id.index(),
            name: node.name.clone(),
            kind: node.kind.label().to_string(),
            generator: node.type_label(),
            path: format_path(&flow.absolute_path(node.id)),
            mean: raw.mean,
            median: raw.median,
            std_dev: raw.std_dev,
            percentiles: format_percentiles(raw),
            cumulative_mean: cumulative.mean,
            cumulative_median: cumulative.median,
            cumulative_std_dev: cumulative.std_dev,
            cumulative_percentiles: format_percentiles(cumulative),
            critical: critical.is_some_and(|path| path.contains_node(node.id)),
            estimated_completion: estimated_completion(flow, node, calendar)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        });
    }
    Ok(records)
}

pub fn write_summary_csv<W: Write>(
    flow: &FlowGraph,
    calendar: Option<&WorkCalendar>,
    writer: W,
) -> ExportResult<()> {
    let records = summary_records(flow, calendar)?;
    let mut writer = csv::Writer::from_writer(writer);
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_summary_csv<P: AsRef<Path>>(
    flow: &FlowGraph,
    calendar: Option<&WorkCalendar>,
    path: P,
) -> ExportResult<()> {
    let file = File::create(path)?;
    write_summary_csv(flow, calendar, file)
}

/// Histogram and CDF of the project completion distribution (root join
/// cumulative values), using the configured bin count.
pub fn distribution_records(flow: &FlowGraph) -> ExportResult<Vec<DistributionRecord>> {
    ensure_evaluated(flow)?;
    let Some(result) = flow.result(flow.output()) else {
        return Ok(Vec::new());
    };
    let bins = flow.config().histogram_bins;
    let samples = &result.cumulative_values;
    Ok(histogram(samples, bins)
        .into_iter()
        .zip(cdf(samples, bins))
        .map(|(bin, point)| DistributionRecord {
            bin_lower: bin.lower,
            bin_upper: bin.upper,
            count: bin.count,
            density: bin.density,
            cumulative_fraction: point.cumulative_fraction,
        })
        .collect())
}

pub fn write_distribution_csv<W: Write>(flow: &FlowGraph, writer: W) -> ExportResult<()> {
    let records = distribution_records(flow)?;
    let mut writer = csv::Writer::from_writer(writer);
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_distribution_csv<P: AsRef<Path>>(flow: &FlowGraph, path: P) -> ExportResult<()> {
    let file = File::create(path)?;
    write_distribution_csv(flow, file)
}
