//! Loading activity definitions from JSON into a [`FlowGraph`].
//!
//! ```json
//! {
//!   "name": "Launch",
//!   "runCount": 1000,
//!   "percentiles": [50, 90],
//!   "workdays": true,
//!   "activities": {
//!     "build": [ { "type": "PERT(2, 3, 6)", "name": "Design" }, { "type": "Fixed(5)" } ],
//!     "qa": { "unit": { "type": "Normal(4, 1)" }, "e2e": { "type": "Uniform(2, 6)" } },
//!     "rollout": { "name": "Rollout", "activities": { "steps": [ { "type": "Fixed(1)" } ] } }
//!   }
//! }
//! ```
//!
//! Arrays are serial chains, objects with their own `activities` are nested
//! subgraphs, and any other object is a set of parallel activities.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::error::FlowError;
use crate::generator::DurationGenerator;
use crate::graph::flow_graph::DEFAULT_PERCENTILES;
use crate::graph::{AggregationOptions, FlowGraph, SubgraphId};

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid definition: {0}")]
    Invalid(String),
    #[error(transparent)]
    Flow(#[from] FlowError),
}

pub type DefinitionResult<T> = Result<T, DefinitionError>;

fn default_percentiles() -> Vec<f64> {
    DEFAULT_PERCENTILES.to_vec()
}

/// Top-level activity definition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDefinition {
    #[serde(default)]
    pub name: String,
    pub run_count: u64,
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
    #[serde(default)]
    pub workdays: bool,
    pub activities: Map<String, Value>,
}

/// A single leaf activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySpec {
    #[serde(rename = "type")]
    pub expression: String,
    #[serde(default)]
    pub name: Option<String>,
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

impl ActivityDefinition {
    pub fn from_json(input: &str) -> DefinitionResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> DefinitionResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Builds the flow graph described by this definition. Generator
    /// expressions are parsed here; evaluation is left to the caller.
    pub fn build(&self) -> DefinitionResult<FlowGraph> {
        let aggregation = AggregationOptions {
            workdays: self.workdays,
        };
        let mut flow = FlowGraph::with_aggregation(self.name.clone(), self.run_count, aggregation)
            .with_percentiles(self.percentiles.clone());
        let root = flow.root();
        add_activities(&mut flow, root, &self.activities)?;
        debug!(
            graph = %self.name,
            nodes = flow.node_count(),
            edges = flow.edge_count(),
            "built flow graph from definition"
        );
        Ok(flow)
    }
}

fn parse_leaf(value: &Value, default_name: &str) -> DefinitionResult<(String, DurationGenerator)> {
    let spec: ActivitySpec = serde_json::from_value(value.clone()).map_err(|err| {
        DefinitionError::Invalid(format!("activity `{default_name}`: {err}"))
    })?;
    let generator = DurationGenerator::parse(&spec.expression)?;
    let name = spec
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| default_name.to_string());
    Ok((name, generator))
}

fn add_activities(
    flow: &mut FlowGraph,
    subgraph: SubgraphId,
    activities: &Map<String, Value>,
) -> DefinitionResult<()> {
    for (key, value) in activities {
        debug!(key = %key, subgraph = %subgraph, "unmarshalling activity group");
        match value {
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    let (name, generator) = parse_leaf(item, &format!("serial-{idx}"))?;
                    flow.add_serial_node(subgraph, name, generator)?;
                }
            }
            Value::Object(group) => match group.get("activities") {
                Some(Value::Object(nested)) => {
                    let name = group
                        .get("name")
                        .and_then(Value::as_str)
                        .filter(|name| !name.is_empty())
                        .unwrap_or(key);
                    let child = flow.add_subgraph(subgraph, name)?;
                    add_activities(flow, child, nested)?;
                }
                Some(other) => {
                    return Err(DefinitionError::Invalid(format!(
                        "`activities` of `{key}` must be an object, found {}",
                        value_kind(other)
                    )));
                }
                None => {
                    for (activity_key, activity) in group {
                        let (name, generator) = parse_leaf(activity, activity_key)?;
                        flow.add_parallel_node(subgraph, name, generator)?;
                    }
                }
            },
            other => {
                return Err(DefinitionError::Invalid(format!(
                    "activity group `{key}` must be a list or an object, found {}",
                    value_kind(other)
                )));
            }
        }
    }
    Ok(())
}

pub fn load_flow_graph_from_json<P: AsRef<Path>>(path: P) -> DefinitionResult<FlowGraph> {
    let file = File::open(path)?;
    ActivityDefinition::from_reader(file)?.build()
}
