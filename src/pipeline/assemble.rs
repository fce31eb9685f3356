//! Graph assembly - fold accepted chunk results into the global graph.
//!
//! Assembly is append-only per chunk. The only rewrite is same-merge
//! deduplication: a near-duplicate component is discarded in favor of the
//! earliest-accepted copy, and relations referencing the discarded id are
//! redirected to the kept one before insertion.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::pipeline::parse::CandidateRelation;
use crate::types::component::{ArgumentComponent, ArgumentRelation};
use crate::types::graph::ArgumentGraph;

/// Folds per-chunk results into the graph, deduplicating as it goes.
///
/// Holds run-scoped state: the id rewrite map survives across chunks so a
/// relation extracted later can still reference a component that was
/// deduplicated earlier.
#[derive(Debug)]
pub struct Assembler {
    overlap_threshold: f32,
    max_out_degree: usize,
    rewrites: HashMap<String, String>,
}

/// Counts from one merge call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub components_added: usize,
    pub components_deduplicated: usize,
    pub relations_added: usize,
    pub relations_dropped: usize,
}

impl Assembler {
    /// Create an assembler with the configured duplicate threshold and
    /// per-source fan-out ceiling.
    pub fn new(overlap_threshold: f32, max_out_degree: usize) -> Self {
        Self {
            overlap_threshold,
            max_out_degree,
            rewrites: HashMap::new(),
        }
    }

    /// Merge one chunk's accepted components and relations into `graph`.
    pub fn merge(
        &mut self,
        graph: &mut ArgumentGraph,
        components: Vec<ArgumentComponent>,
        relations: Vec<CandidateRelation>,
    ) -> MergeReport {
        let mut report = MergeReport::default();

        for component in components {
            match self.find_duplicate(graph, &component) {
                Some(kept_id) => {
                    debug!(
                        discarded = %component.id,
                        kept = %kept_id,
                        "near-duplicate component discarded"
                    );
                    self.rewrites.insert(component.id, kept_id);
                    report.components_deduplicated += 1;
                }
                None => {
                    graph.insert_node(component);
                    report.components_added += 1;
                }
            }
        }

        for relation in relations {
            let source = self.resolve(&relation.source);
            let target = self.resolve(&relation.target);

            // A rewrite that collapses both endpoints onto the kept id
            // is a dedup artifact, not an asserted self-loop.
            if source == target && relation.source != relation.target {
                debug!(id = %source, "relation collapsed by dedup rewrite, dropped");
                report.relations_dropped += 1;
                continue;
            }

            // Relation page: asserted at the later of the two endpoints.
            let page = match (graph.node(&source), graph.node(&target)) {
                (Some(s), Some(t)) => s.page.max(t.page),
                _ => {
                    report.relations_dropped += 1;
                    continue;
                }
            };

            // Cumulative fan-out ceiling over the whole graph; the
            // per-response confidence ranking already happened at the
            // parse boundary.
            if graph.out_degree(&source) >= self.max_out_degree {
                warn!(source = %source, "out-degree cap reached at merge, relation dropped");
                report.relations_dropped += 1;
                continue;
            }

            let edge = ArgumentRelation::new(source, target, relation.relation, page);
            if graph.insert_edge(edge) {
                report.relations_added += 1;
            } else {
                report.relations_dropped += 1;
            }
        }

        report
    }

    /// Follow the rewrite map for an id that may have been deduplicated.
    fn resolve(&self, id: &str) -> String {
        self.rewrites.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    /// Find an existing node this candidate duplicates, if any.
    ///
    /// Duplicates share page and type and have high textual overlap;
    /// containment counts as overlap regardless of length ratio.
    fn find_duplicate(&self, graph: &ArgumentGraph, candidate: &ArgumentComponent) -> Option<String> {
        graph
            .nodes()
            .find(|existing| {
                existing.page == candidate.page
                    && existing.kind == candidate.kind
                    && texts_overlap(&existing.text, &candidate.text, self.overlap_threshold)
            })
            .map(|existing| existing.id.clone())
    }
}

/// Near-duplicate test: substring containment or word-set Jaccard
/// similarity at or above the threshold.
pub fn texts_overlap(a: &str, b: &str, threshold: f32) -> bool {
    let a_norm = a.trim().to_lowercase();
    let b_norm = b.trim().to_lowercase();
    if a_norm.contains(&b_norm) || b_norm.contains(&a_norm) {
        return true;
    }
    jaccard_similarity(&a_norm, &b_norm) >= threshold
}

/// Jaccard similarity over lowercase word sets.
pub fn jaccard_similarity(a: &str, b: &str) -> f32 {
    let words_a: std::collections::HashSet<&str> = a.split_whitespace().collect();
    let words_b: std::collections::HashSet<&str> = b.split_whitespace().collect();

    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f32 / union as f32
}
