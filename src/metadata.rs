use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Descriptive information about an estimate, carried by the Start node and
/// surfaced to exporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateMetadata {
    pub name: String,
    pub run_count: u64,
    pub percentiles: Vec<f64>,
    pub workdays: bool,
    pub seed: u64,
    pub start_date: NaiveDate,
    /// Set once the graph has been evaluated.
    pub created: Option<NaiveDateTime>,
}
