//! Referential-integrity and flow-graph checks.
//!
//! The differ treats references as opaque strings; consumers that need to
//! know whether a model is internally consistent run these checks instead.

use std::collections::{BTreeSet, HashSet};

use petgraph::{algo::is_cyclic_directed, graphmap::DiGraphMap, visit::Dfs, Direction};
use serde::Serialize;

use crate::{
    core::{ElementKind, Model},
    types::ElementId,
};

/// A reference to an id that does not exist in the same model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingReference {
    pub element: ElementId,
    /// `parent` or the name of the reference attribute.
    pub field: String,
    pub target: String,
}

/// Every dangling `parent` and registered reference field, sorted.
pub fn dangling_references(model: &Model) -> Vec<DanglingReference> {
    let mut dangling = Vec::new();
    for element in model {
        if let Some(parent) = &element.parent {
            if !model.contains(parent.as_str()) {
                dangling.push(DanglingReference {
                    element: element.id.clone(),
                    field: "parent".to_owned(),
                    target: parent.to_string(),
                });
            }
        }
        for (field, target) in element.references() {
            if !model.contains(target) {
                dangling.push(DanglingReference {
                    element: element.id.clone(),
                    field: field.to_owned(),
                    target: target.to_owned(),
                });
            }
        }
    }
    dangling.sort();
    dangling
}

/// Directed graph of flow nodes connected by sequence flows.
///
/// Flows whose endpoints are missing from the model are left out. Each
/// edge holds every flow between its two nodes.
#[derive(Debug)]
pub struct FlowGraph<'a> {
    model: &'a Model,
    graph: DiGraphMap<&'a str, Vec<&'a ElementId>>,
}

impl<'a> FlowGraph<'a> {
    pub fn new(model: &'a Model) -> Self {
        let mut graph: DiGraphMap<&'a str, Vec<&'a ElementId>> = DiGraphMap::new();
        for element in model.iter().filter(|e| e.kind.is_flow_node()) {
            graph.add_node(element.id.as_str());
        }
        for flow in model.iter().filter(|e| e.kind == ElementKind::SequenceFlow) {
            let (Some(source), Some(target)) = (flow.source_ref(), flow.target_ref()) else {
                continue;
            };
            if !(graph.contains_node(source) && graph.contains_node(target)) {
                continue;
            }
            match graph.edge_weight_mut(source, target) {
                Some(flows) => flows.push(&flow.id),
                None => {
                    graph.add_edge(source, target, vec![&flow.id]);
                }
            }
        }
        Self { model, graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn flow_count(&self) -> usize {
        self.graph.all_edges().map(|(_, _, flows)| flows.len()).sum()
    }

    /// Whether the flow contains a loop (for example a gateway back-edge).
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Direct successors of a node, sorted.
    pub fn successors(&self, id: &str) -> Vec<&'a str> {
        let Some(node) = self.model.get(id).map(|element| element.id.as_str()) else {
            return Vec::new();
        };
        if !self.graph.contains_node(node) {
            return Vec::new();
        }
        let mut next: Vec<&str> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        next.sort_unstable();
        next
    }

    /// Flow nodes that no start event reaches, sorted.
    ///
    /// Nodes without incoming flow that are not start events (such as
    /// boundary events or event sub-process starts) count as entry points.
    pub fn unreachable(&self) -> Vec<&'a str> {
        let mut reached = HashSet::new();
        let entries = self.graph.nodes().filter(|&node| {
            let is_start = self
                .model
                .get(node)
                .is_some_and(|element| element.kind == ElementKind::StartEvent);
            is_start
                || self
                    .graph
                    .neighbors_directed(node, Direction::Incoming)
                    .next()
                    .is_none()
        });
        for entry in entries {
            let mut dfs = Dfs::new(&self.graph, entry);
            while let Some(node) = dfs.next(&self.graph) {
                reached.insert(node);
            }
        }
        let unreached: BTreeSet<&str> = self
            .graph
            .nodes()
            .filter(|node| !reached.contains(node))
            .collect();
        unreached.into_iter().collect()
    }
}
