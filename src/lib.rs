pub mod calculations;
pub mod calendar;
pub mod config;
pub mod definition;
pub mod error;
pub mod export;
pub mod generator;
pub mod graph;
pub mod metadata;
pub mod stats;

pub use calculations::{CriticalPath, NodePath, ResultsTable};
pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use config::EvaluationConfig;
pub use definition::{ActivityDefinition, DefinitionError, load_flow_graph_from_json};
pub use error::{FlowError, FlowResult};
pub use export::{ExportError, GraphExport, summary_frame, to_dot};
pub use generator::{DurationGenerator, GenerationResult};
pub use graph::{AggregationOptions, FlowGraph, FlowNode, NodeId, NodeKind, SubgraphId};
pub use metadata::EstimateMetadata;
pub use stats::{AggregatedStatistics, stats_for_sequence};
