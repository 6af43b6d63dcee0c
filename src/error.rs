use thiserror::Error;

use crate::graph::NodeId;

/// Failures raised while building or evaluating a flow graph.
///
/// Every variant carries enough context (node identity, offending
/// expression) to be reported verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("invalid generator expression `{expression}`: {reason}")]
    Parse { expression: String, reason: String },

    #[error("invalid distribution `{expression}`: {reason}")]
    Validation { expression: String, reason: String },

    #[error("structural error at node {node}: {reason}")]
    Structural { node: NodeId, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl FlowError {
    pub(crate) fn parse(expression: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(expression: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn structural(node: NodeId, reason: impl Into<String>) -> Self {
        Self::Structural {
            node,
            reason: reason.into(),
        }
    }
}

pub type FlowResult<T> = Result<T, FlowError>;
