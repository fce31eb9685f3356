//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that drive the pipeline
//! without making real model calls.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{ExtractionError, Result};
use crate::traits::engine::{
    ComponentRequest, RawComponent, RawRelation, ReasoningEngine, RelationRequest,
};

/// A mock reasoning engine for testing.
///
/// Scripted responses are consumed in order, one per call; once the
/// script runs out the mock returns empty candidate lists. Failure
/// injection makes the next N calls of a kind fail with a retryable
/// engine error, which is how retry and chunk-skip paths get exercised.
#[derive(Default)]
pub struct MockEngine {
    /// Scripted component responses, consumed front to back
    component_responses: Arc<RwLock<VecDeque<Vec<RawComponent>>>>,

    /// Scripted relation responses, consumed front to back
    relation_responses: Arc<RwLock<VecDeque<Vec<RawRelation>>>>,

    /// Remaining injected component-call failures
    component_failures: Arc<RwLock<usize>>,

    /// Remaining injected relation-call failures
    relation_failures: Arc<RwLock<usize>>,

    /// Requests received, for assertions
    component_calls: Arc<RwLock<Vec<ComponentRequest>>>,
    relation_calls: Arc<RwLock<Vec<RelationRequest>>>,
}

impl MockEngine {
    /// Create a new mock engine with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one component response.
    pub fn with_component_response(self, components: Vec<RawComponent>) -> Self {
        self.component_responses
            .write()
            .unwrap()
            .push_back(components);
        self
    }

    /// Queue one relation response.
    pub fn with_relation_response(self, relations: Vec<RawRelation>) -> Self {
        self.relation_responses.write().unwrap().push_back(relations);
        self
    }

    /// Make the next `count` component calls fail.
    ///
    /// Failures are consumed before the scripted queue, so a script of
    /// one failure followed by a response models fail-then-recover.
    pub fn fail_component_calls(self, count: usize) -> Self {
        *self.component_failures.write().unwrap() = count;
        self
    }

    /// Make the next `count` relation calls fail.
    pub fn fail_relation_calls(self, count: usize) -> Self {
        *self.relation_failures.write().unwrap() = count;
        self
    }

    /// Component requests received so far.
    pub fn component_calls(&self) -> Vec<ComponentRequest> {
        self.component_calls.read().unwrap().clone()
    }

    /// Relation requests received so far.
    pub fn relation_calls(&self) -> Vec<RelationRequest> {
        self.relation_calls.read().unwrap().clone()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.component_calls.write().unwrap().clear();
        self.relation_calls.write().unwrap().clear();
    }

    fn take_failure(counter: &Arc<RwLock<usize>>) -> bool {
        let mut remaining = counter.write().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }

    fn injected_failure() -> ExtractionError {
        ExtractionError::Engine(Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "injected engine failure",
        )))
    }
}

#[async_trait]
impl ReasoningEngine for MockEngine {
    async fn extract_components(&self, request: &ComponentRequest) -> Result<Vec<RawComponent>> {
        self.component_calls.write().unwrap().push(request.clone());

        if Self::take_failure(&self.component_failures) {
            return Err(Self::injected_failure());
        }

        Ok(self
            .component_responses
            .write()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn extract_relations(&self, request: &RelationRequest) -> Result<Vec<RawRelation>> {
        self.relation_calls.write().unwrap().push(request.clone());

        if Self::take_failure(&self.relation_failures) {
            return Err(Self::injected_failure());
        }

        Ok(self
            .relation_responses
            .write()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}
