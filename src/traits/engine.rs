//! Reasoning engine trait - the boundary to the external LLM service.
//!
//! The pipeline makes exactly two calls per chunk: component extraction
//! then relation extraction. Implementations wrap a specific provider and
//! own prompt wording and transport; they return *raw* candidates with
//! free-form type strings. All shape and reference validation happens
//! crate-side in [`crate::pipeline::parse`] so implementations stay thin.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pipeline::context::ContextWindow;
use crate::types::component::ArgumentComponent;

/// Boundary to the external reasoning engine.
///
/// Both calls are pure request/response. Failures are retried by the
/// pipeline with exponential backoff; implementations should not retry
/// internally.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Extract candidate components from a chunk of pages.
    ///
    /// Every candidate should carry a type, a verbatim text span, and a
    /// page inside `request.page_range`; candidates that do not are
    /// dropped at the boundary, not fatal to the chunk.
    async fn extract_components(&self, request: &ComponentRequest) -> Result<Vec<RawComponent>>;

    /// Extract candidate relations between visible components.
    ///
    /// `request.visible_components` is the union of the chunk's accepted
    /// components and the context window's components; candidates that
    /// reference anything else are dropped at the boundary.
    async fn extract_relations(&self, request: &RelationRequest) -> Result<Vec<RawRelation>>;
}

/// Request for component extraction from one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRequest {
    /// Combined chunk text with page separators
    pub chunk_text: String,

    /// Inclusive [min, max] page range of the chunk
    pub page_range: (u32, u32),

    /// Carry-over state from previously processed chunks
    pub context: ContextWindow,

    /// Advisory component count cap, not a hard guarantee
    pub target_components: usize,
}

/// Request for relation extraction from one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRequest {
    /// Combined chunk text with page separators
    pub chunk_text: String,

    /// Inclusive [min, max] page range of the chunk
    pub page_range: (u32, u32),

    /// Carry-over state from previously processed chunks
    pub context: ContextWindow,

    /// Components the engine may reference: this chunk's accepted
    /// components plus the context window's components
    pub visible_components: Vec<ArgumentComponent>,

    /// Advisory relation count cap, not a hard guarantee
    pub target_relations: usize,
}

/// An unvalidated component candidate as returned by the engine.
///
/// Fields are optional because engine output is untrusted; the boundary
/// validator decides what survives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawComponent {
    /// Free-form type string, validated against [`crate::ComponentType`]
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Verbatim text span
    pub text: Option<String>,

    /// 1-based page number
    pub page: Option<u32>,
}

impl RawComponent {
    /// Construct a well-formed candidate (mocks and tests).
    pub fn new(kind: impl Into<String>, text: impl Into<String>, page: u32) -> Self {
        Self {
            kind: Some(kind.into()),
            text: Some(text.into()),
            page: Some(page),
        }
    }
}

/// An unvalidated relation candidate as returned by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRelation {
    /// Source component id
    pub source: Option<String>,

    /// Target component id
    pub target: Option<String>,

    /// Free-form relation string, validated against [`crate::RelationType`]
    pub relation: Option<String>,

    /// Engine confidence in [0, 1]; used when the out-degree cap drops
    /// excess edges
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl RawRelation {
    /// Construct a well-formed candidate (mocks and tests).
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            relation: Some(relation.into()),
            confidence: None,
        }
    }

    /// Set the confidence score.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
