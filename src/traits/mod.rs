//! Core trait abstractions for the pipeline.
//!
//! The only seam is the reasoning engine boundary: applications implement
//! [`engine::ReasoningEngine`] to plug in a concrete LLM provider.

pub mod engine;
