use polars::prelude::*;

use super::ExportResult;
use super::tables::{NodeSummaryRecord, summary_records};
use crate::calendar::WorkCalendar;
use crate::graph::FlowGraph;

/// Per-node summary as a polars frame, one row per evaluated node.
pub fn summary_frame(flow: &FlowGraph, calendar: Option<&WorkCalendar>) -> ExportResult<DataFrame> {
    let records = summary_records(flow, calendar)?;
    Ok(frame_from_records(&records)?)
}

fn f64_column(name: &'static str, records: &[NodeSummaryRecord], f: fn(&NodeSummaryRecord) -> f64) -> Column {
    let values: Vec<f64> = records.iter().map(f).collect();
    Series::new(PlSmallStr::from_static(name), values).into_column()
}

fn str_column(
    name: &'static str,
    records: &[NodeSummaryRecord],
    f: fn(&NodeSummaryRecord) -> &str,
) -> Column {
    let values: Vec<&str> = records.iter().map(f).collect();
    Series::new(PlSmallStr::from_static(name), values).into_column()
}

pub(crate) fn frame_from_records(records: &[NodeSummaryRecord]) -> PolarsResult<DataFrame> {
    let ids: Vec<u64> = records.iter().map(|r| r.id as u64).collect();
    let critical: Vec<bool> = records.iter().map(|r| r.critical).collect();
    let completion: Vec<Option<&str>> = records
        .iter()
        .map(|r| Some(r.estimated_completion.as_str()).filter(|s| !s.is_empty()))
        .collect();

    let columns = vec![
        Series::new(PlSmallStr::from_static("id"), ids).into_column(),
        str_column("name", records, |r| r.name.as_str()),
        str_column("kind", records, |r| r.kind.as_str()),
        str_column("generator", records, |r| r.generator.as_str()),
        str_column("path", records, |r| r.path.as_str()),
        f64_column("mean", records, |r| r.mean),
        f64_column("median", records, |r| r.median),
        f64_column("std_dev", records, |r| r.std_dev),
        f64_column("cumulative_mean", records, |r| r.cumulative_mean),
        f64_column("cumulative_median", records, |r| r.cumulative_median),
        f64_column("cumulative_std_dev", records, |r| r.cumulative_std_dev),
        Series::new(PlSmallStr::from_static("critical"), critical).into_column(),
        Series::new(PlSmallStr::from_static("estimated_completion"), completion).into_column(),
    ];
    DataFrame::new(columns)
}
