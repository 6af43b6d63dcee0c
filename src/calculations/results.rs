use std::collections::BTreeMap;

use crate::error::{FlowError, FlowResult};
use crate::generator::GenerationResult;
use crate::graph::NodeId;

/// Write-once table of generation results keyed by node identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    results: BTreeMap<NodeId, GenerationResult>,
}

impl ResultsTable {
    pub fn insert(&mut self, node: NodeId, result: GenerationResult) -> FlowResult<()> {
        if self.results.contains_key(&node) {
            return Err(FlowError::structural(node, "result already recorded for node"));
        }
        self.results.insert(node, result);
        Ok(())
    }

    pub fn get(&self, node: NodeId) -> Option<&GenerationResult> {
        self.results.get(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.results.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in ascending node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &GenerationResult)> + '_ {
        self.results.iter().map(|(id, result)| (*id, result))
    }
}
