//! Argument Graph Extraction Library
//!
//! Turns a paginated document into a directed graph of argumentative
//! components (claims, evidence, conclusions, ...) connected by typed
//! logical relations, using a pluggable reasoning engine for the two
//! extraction calls per chunk.
//!
//! # Design Philosophy
//!
//! **"Trust the structure, not the engine"**
//!
//! - Engine output is untrusted: everything is validated at the boundary
//! - Bad candidates are dropped and counted, never fatal
//! - Insertion order everywhere, so identical input gives identical output
//! - A failed chunk is skipped whole; the run finishes
//! - Library handles mechanics, the engine handles semantics
//!
//! # Usage
//!
//! ```rust,ignore
//! use arggraph::{Page, Pipeline, PipelineConfig};
//! use arggraph::testing::MockEngine;
//!
//! let pages: Vec<Page> = load_document()?;
//! let pipeline = Pipeline::with_config(MockEngine::new(), PipelineConfig::default());
//!
//! let outcome = pipeline.run(&pages).await?;
//! let json = serde_json::to_string_pretty(&outcome.graph.to_output())?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The reasoning engine port
//! - [`types`] - Components, relations, pages, the graph, configuration
//! - [`pipeline`] - Chunk planning, context carrying, the run loop
//! - [`validate`] - Post-hoc structural validation and pruning
//! - [`analysis`] - Complexity classification for presentation layers
//! - [`testing`] - Mock engine for testing

pub mod analysis;
pub mod error;
pub mod pipeline;
pub mod testing;
pub mod traits;
pub mod types;
pub mod validate;

// Re-export core types at crate root
pub use error::{ExtractionError, Result};
pub use pipeline::{
    Chunk, ChunkFailure, ContextWindow, Pipeline, RunDiagnostics, RunOutcome,
};
pub use traits::engine::{
    ComponentRequest, RawComponent, RawRelation, ReasoningEngine, RelationRequest,
};
pub use types::{
    component::{ArgumentComponent, ArgumentRelation, ComponentType, RelationType},
    config::{ContextPolicy, PipelineConfig},
    graph::{ArgumentGraph, GraphOutput, GraphStatistics},
    page::{check_page_sequence, Page, TextStats},
};
pub use validate::{validate, validate_output, Defect, Severity};
pub use analysis::{analyze, ComplexityReport, ComplexityThresholds, ComplexityTier};
