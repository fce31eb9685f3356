//! Post-hoc structural validation of an assembled graph.
//!
//! The pipeline's insert-time checks already prevent duplicate ids,
//! dangling endpoints, and out-of-enumeration kinds, so on a graph the
//! pipeline built most checks pass trivially. Graphs deserialized from
//! external output have no such guarantee, which is what this module is
//! for. Validation never mutates; pruning is a separate opt-in step.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::graph::{ArgumentGraph, GraphOutput};

/// How bad a defect is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Structurally invalid; [`prune`] removes the offending edge
    Error,

    /// Unusual but representable; kept by [`prune`]
    Warning,
}

/// A structural finding about one edge or node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "defect", rename_all = "snake_case")]
pub enum Defect {
    /// Node id occurring more than once in serialized output; the
    /// reconstruction kept the first occurrence
    DuplicateId { id: String },

    /// Edge whose source id is not a node in the graph
    OrphanSource { edge_index: usize, source: String },

    /// Edge whose target id is not a node in the graph
    OrphanTarget { edge_index: usize, target: String },

    /// Node whose page falls outside 1..=total_pages
    PageOutOfRange { id: String, page: u32 },

    /// Edge connecting a component to itself
    SelfLoop { edge_index: usize, id: String },

    /// Edge asserted on an earlier page than both of its endpoints
    RelationBeforeEndpoints { edge_index: usize, page: u32 },
}

impl Defect {
    pub fn severity(&self) -> Severity {
        match self {
            Defect::DuplicateId { .. }
            | Defect::OrphanSource { .. }
            | Defect::OrphanTarget { .. }
            | Defect::PageOutOfRange { .. } => Severity::Error,
            Defect::SelfLoop { .. } | Defect::RelationBeforeEndpoints { .. } => Severity::Warning,
        }
    }

    /// Index of the implicated edge, if the defect is about an edge.
    fn edge_index(&self) -> Option<usize> {
        match self {
            Defect::OrphanSource { edge_index, .. }
            | Defect::OrphanTarget { edge_index, .. }
            | Defect::SelfLoop { edge_index, .. }
            | Defect::RelationBeforeEndpoints { edge_index, .. } => Some(*edge_index),
            Defect::DuplicateId { .. } | Defect::PageOutOfRange { .. } => None,
        }
    }
}

/// Validate serialized output before trusting it as a graph.
///
/// The in-memory graph cannot represent duplicate node ids, so they are
/// detected here on the raw output; the reconstruction keeps the first
/// occurrence of each id and then goes through [`validate`].
pub fn validate_output(output: GraphOutput, total_pages: u32) -> (ArgumentGraph, Vec<Defect>) {
    let mut defects = Vec::new();
    let mut seen: HashSet<&str> = HashSet::with_capacity(output.nodes.len());
    for node in &output.nodes {
        if !seen.insert(node.id.as_str()) {
            defects.push(Defect::DuplicateId {
                id: node.id.clone(),
            });
        }
    }

    let graph = output.into_graph_unchecked();
    defects.extend(validate(&graph, total_pages));
    (graph, defects)
}

/// Check the graph's structural invariants against a document of
/// `total_pages` pages.
pub fn validate(graph: &ArgumentGraph, total_pages: u32) -> Vec<Defect> {
    let mut defects = Vec::new();

    for node in graph.nodes() {
        if node.page < 1 || node.page > total_pages {
            defects.push(Defect::PageOutOfRange {
                id: node.id.clone(),
                page: node.page,
            });
        }
    }

    for (i, edge) in graph.edges().iter().enumerate() {
        let source = graph.node(&edge.source);
        let target = graph.node(&edge.target);

        if source.is_none() {
            defects.push(Defect::OrphanSource {
                edge_index: i,
                source: edge.source.clone(),
            });
        }
        if target.is_none() {
            defects.push(Defect::OrphanTarget {
                edge_index: i,
                target: edge.target.clone(),
            });
        }
        if edge.source == edge.target {
            defects.push(Defect::SelfLoop {
                edge_index: i,
                id: edge.source.clone(),
            });
        }
        if let (Some(source), Some(target)) = (source, target) {
            if edge.page < source.page.min(target.page) {
                defects.push(Defect::RelationBeforeEndpoints {
                    edge_index: i,
                    page: edge.page,
                });
            }
        }
    }

    debug!(defects = defects.len(), "graph validated");
    defects
}

/// Remove edges implicated by error-severity defects.
///
/// Warnings are left alone. Node-level defects are reported but never
/// pruned; dropping extracted text is the caller's decision.
pub fn prune(graph: &mut ArgumentGraph, defects: &[Defect]) -> usize {
    let condemned: Vec<usize> = defects
        .iter()
        .filter(|d| d.severity() == Severity::Error)
        .filter_map(|d| d.edge_index())
        .collect();

    if condemned.is_empty() {
        return 0;
    }

    let before = graph.edge_count();
    let mut index = 0;
    graph.retain_edges(|_| {
        let keep = !condemned.contains(&index);
        index += 1;
        keep
    });
    before - graph.edge_count()
}
