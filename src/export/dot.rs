use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::graph::{FlowGraph, FlowNode};

fn node_label(flow: &FlowGraph, node: &FlowNode) -> String {
    let mut label = format!("{}\\n{}", node.name.replace('"', "\\\""), node.type_label());
    if let Some(result) = flow.result(node.id) {
        label.push_str(&format!(
            "\\nμ={:.2} Σμ={:.2}",
            result.generator_stats.mean, result.cumulative_stats.mean
        ));
    }
    label
}

/// Graphviz rendering. Critical edges are drawn red once the graph has been
/// evaluated.
pub fn to_dot(flow: &FlowGraph) -> String {
    let critical = flow.critical_path();
    let mut mirror: DiGraph<String, bool> =
        DiGraph::with_capacity(flow.node_count(), flow.edge_count());
    for node in flow.nodes() {
        mirror.add_node(node_label(flow, node));
    }
    for (source, target) in flow.edges() {
        let on_path = critical.is_some_and(|path| path.contains_edge(source, target));
        mirror.add_edge(
            NodeIndex::new(source.index()),
            NodeIndex::new(target.index()),
            on_path,
        );
    }

    let edge_attrs = |_: &DiGraph<String, bool>, edge: EdgeReference<'_, bool>| {
        if *edge.weight() {
            "color=red, penwidth=2".to_string()
        } else {
            String::new()
        }
    };
    let node_attrs = |_: &DiGraph<String, bool>, (_, label): (NodeIndex, &String)| {
        format!("label=\"{label}\", shape=box")
    };
    let dot = Dot::with_attr_getters(
        &mirror,
        &[Config::EdgeNoLabel, Config::NodeNoLabel],
        &edge_attrs,
        &node_attrs,
    );
    format!("{dot}")
}
