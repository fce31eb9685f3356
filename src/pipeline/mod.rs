//! The extraction pipeline, stage by stage.
//!
//! [`chunk`] plans page windows, [`context`] builds the carried summary,
//! [`parse`] validates raw engine output, [`identity`] assigns stable
//! ids, [`assemble`] merges chunk results into the growing graph, and
//! [`run`] folds the stages over a document.

pub mod assemble;
pub mod chunk;
pub mod context;
pub mod identity;
pub mod parse;
pub mod run;

pub use assemble::{jaccard_similarity, texts_overlap, Assembler, MergeReport};
pub use chunk::{pages_per_chunk, plan_chunks, Chunk};
pub use context::ContextWindow;
pub use identity::IdentityAssigner;
pub use parse::{
    extract_json_array, parse_component_response, parse_relation_response, validate_components,
    validate_relations, CandidateComponent, CandidateRelation,
};
pub use run::{ChunkFailure, Pipeline, RunDiagnostics, RunOutcome};
