//! The pipeline run loop - a context-carrying fold over chunks.
//!
//! Chunks are processed in page order. Each step reads the context window
//! built from the graph so far, makes the two engine calls under retry
//! and timeout, assigns identities, and merges the accepted results. The
//! bounded-parallel mode processes a batch of chunks against a context
//! snapshot taken at batch start; merging stays in original chunk order
//! through the single assembler and identity state, so output ids and
//! deduplication are deterministic either way.

use std::collections::HashMap;
use std::collections::HashSet;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result};
use crate::pipeline::assemble::Assembler;
use crate::pipeline::chunk::{plan_chunks, Chunk};
use crate::pipeline::context::ContextWindow;
use crate::pipeline::identity::IdentityAssigner;
use crate::pipeline::parse::{
    validate_components, validate_relations, CandidateComponent, CandidateRelation,
};
use crate::traits::engine::{ComponentRequest, RawComponent, RawRelation, ReasoningEngine, RelationRequest};
use crate::types::component::ArgumentComponent;
use crate::types::config::PipelineConfig;
use crate::types::graph::ArgumentGraph;
use crate::types::page::{check_page_sequence, Page};

/// First retry delay; doubles on every subsequent attempt.
const INITIAL_BACKOFF_MS: u64 = 500;

/// Ceiling on the retry delay, whatever the attempt count.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Delay before retrying after the given 1-based attempt.
fn backoff_delay(attempt: usize) -> std::time::Duration {
    let exp = attempt.saturating_sub(1).min(6) as u32;
    std::time::Duration::from_millis((INITIAL_BACKOFF_MS << exp).min(MAX_BACKOFF_MS))
}

/// The extraction pipeline: an engine plus its configuration.
pub struct Pipeline<E: ReasoningEngine> {
    engine: E,
    config: PipelineConfig,
}

/// Everything a completed run produces.
#[derive(Debug)]
pub struct RunOutcome {
    /// The assembled argument graph
    pub graph: ArgumentGraph,

    /// Run-level diagnostics: failed chunks and drop counts
    pub diagnostics: RunDiagnostics,
}

/// Run-level diagnostics.
#[derive(Debug, Clone, Default)]
pub struct RunDiagnostics {
    pub chunks_planned: usize,
    pub chunks_processed: usize,
    pub failed_chunks: Vec<ChunkFailure>,
    pub components_dropped: usize,
    pub relations_dropped: usize,
    pub components_deduplicated: usize,
}

/// Record of a chunk whose extraction irrecoverably failed.
///
/// The chunk was skipped whole: no partial merge.
#[derive(Debug, Clone)]
pub struct ChunkFailure {
    /// Inclusive [min, max] page range of the skipped chunk
    pub page_range: (u32, u32),

    /// Attempts made on the failing call
    pub attempts: usize,

    /// Final error, rendered
    pub reason: String,
}

/// Accepted results of one chunk before identity assignment and merge.
struct ChunkExtraction {
    /// (provisional id, candidate) in response order
    components: Vec<(String, CandidateComponent)>,

    /// Relations referencing provisional ids or context ids
    relations: Vec<CandidateRelation>,

    components_dropped: usize,
    relations_dropped: usize,
}

impl<E: ReasoningEngine> Pipeline<E> {
    /// Create a pipeline with default configuration.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            config: PipelineConfig::default(),
        }
    }

    /// Create a pipeline with custom configuration.
    pub fn with_config(engine: E, config: PipelineConfig) -> Self {
        Self { engine, config }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get a reference to the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run the full extraction over a page sequence.
    pub async fn run(&self, pages: &[Page]) -> Result<RunOutcome> {
        self.run_with_cancel(pages, CancellationToken::new()).await
    }

    /// Run with cancellation support.
    ///
    /// Cancellation is checked between chunks, never mid-chunk: a chunk
    /// either fully completes or its in-flight results are discarded.
    pub async fn run_with_cancel(
        &self,
        pages: &[Page],
        cancel: CancellationToken,
    ) -> Result<RunOutcome> {
        self.config.validate()?;
        check_page_sequence(pages)?;

        let chunks = plan_chunks(pages, &self.config);
        info!(
            pages = pages.len(),
            chunks = chunks.len(),
            "starting extraction run"
        );

        let mut graph = ArgumentGraph::new();
        let mut identity = IdentityAssigner::new();
        let mut assembler = Assembler::new(
            self.config.dedup_overlap_threshold,
            self.config.max_relationships_per_component,
        );
        let mut diagnostics = RunDiagnostics {
            chunks_planned: chunks.len(),
            ..Default::default()
        };

        // Batch size 1 is the strict sequential fold; larger sizes share
        // a context snapshot per batch and join the engine calls.
        for batch in chunks.chunks(self.config.max_parallel_chunks.max(1)) {
            if cancel.is_cancelled() {
                return Err(ExtractionError::Cancelled);
            }

            let context = ContextWindow::build(&graph, &self.config);
            let results = join_all(
                batch
                    .iter()
                    .map(|chunk| self.process_chunk(pages, chunk, &context)),
            )
            .await;

            for (chunk, result) in batch.iter().zip(results) {
                match result {
                    Ok(extraction) => {
                        self.merge_chunk(
                            &mut graph,
                            &mut identity,
                            &mut assembler,
                            &mut diagnostics,
                            chunk,
                            extraction,
                        );
                        diagnostics.chunks_processed += 1;
                    }
                    Err(failure) => {
                        warn!(
                            pages = ?failure.page_range,
                            attempts = failure.attempts,
                            reason = %failure.reason,
                            "chunk skipped after exhausted retries"
                        );
                        diagnostics.failed_chunks.push(failure);
                    }
                }
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            failed_chunks = diagnostics.failed_chunks.len(),
            "extraction run complete"
        );

        Ok(RunOutcome { graph, diagnostics })
    }

    /// Process one chunk: two engine calls plus boundary validation.
    ///
    /// Components get chunk-local provisional ids so the relation call
    /// has a visible set to reference; final ids are assigned at merge
    /// time in chunk order.
    async fn process_chunk(
        &self,
        pages: &[Page],
        chunk: &Chunk,
        context: &ContextWindow,
    ) -> std::result::Result<ChunkExtraction, ChunkFailure> {
        debug!(pages = ?chunk.page_range, "processing chunk");
        let chunk_text = chunk.combined_text(pages);

        let component_request = ComponentRequest {
            chunk_text: chunk_text.clone(),
            page_range: chunk.page_range,
            context: context.clone(),
            target_components: chunk.target_components,
        };
        let raw_components: Vec<RawComponent> = self
            .call_with_retry(|| self.engine.extract_components(&component_request))
            .await
            .map_err(|(error, attempts)| ChunkFailure {
                page_range: chunk.page_range,
                attempts,
                reason: error.to_string(),
            })?;

        let (candidates, components_dropped) = validate_components(raw_components, chunk.page_range);

        let mut local_ids = IdentityAssigner::new();
        let components: Vec<(String, CandidateComponent)> = candidates
            .into_iter()
            .map(|c| (local_ids.assign(c.kind, c.page), c))
            .collect();

        // Nothing to relate: skip the second call entirely.
        if components.is_empty() && context.components.is_empty() {
            return Ok(ChunkExtraction {
                components,
                relations: Vec::new(),
                components_dropped,
                relations_dropped: 0,
            });
        }

        let visible_components: Vec<ArgumentComponent> = components
            .iter()
            .map(|(id, c)| ArgumentComponent::new(id.clone(), c.kind, c.text.clone(), c.page))
            .chain(context.components.iter().cloned())
            .collect();

        let relation_request = RelationRequest {
            chunk_text,
            page_range: chunk.page_range,
            context: context.clone(),
            visible_components: visible_components.clone(),
            target_relations: chunk.target_relations,
        };
        let raw_relations: Vec<RawRelation> = self
            .call_with_retry(|| self.engine.extract_relations(&relation_request))
            .await
            .map_err(|(error, attempts)| ChunkFailure {
                page_range: chunk.page_range,
                attempts,
                reason: error.to_string(),
            })?;

        let visible: HashSet<&str> = visible_components.iter().map(|c| c.id.as_str()).collect();
        let (relations, relations_dropped) = validate_relations(
            raw_relations,
            &visible,
            self.config.max_relationships_per_component,
        );

        Ok(ChunkExtraction {
            components,
            relations,
            components_dropped,
            relations_dropped,
        })
    }

    /// Assign final identities and fold one chunk's results into the graph.
    fn merge_chunk(
        &self,
        graph: &mut ArgumentGraph,
        identity: &mut IdentityAssigner,
        assembler: &mut Assembler,
        diagnostics: &mut RunDiagnostics,
        chunk: &Chunk,
        extraction: ChunkExtraction,
    ) {
        let mut final_ids: HashMap<String, String> = HashMap::new();
        let mut components = Vec::with_capacity(extraction.components.len());
        for (provisional, candidate) in extraction.components {
            let id = identity.assign(candidate.kind, candidate.page);
            final_ids.insert(provisional, id.clone());
            components.push(ArgumentComponent::new(
                id,
                candidate.kind,
                candidate.text,
                candidate.page,
            ));
        }

        let relations = extraction
            .relations
            .into_iter()
            .map(|mut relation| {
                if let Some(id) = final_ids.get(&relation.source) {
                    relation.source = id.clone();
                }
                if let Some(id) = final_ids.get(&relation.target) {
                    relation.target = id.clone();
                }
                relation
            })
            .collect();

        let report = assembler.merge(graph, components, relations);
        debug!(
            pages = ?chunk.page_range,
            added = report.components_added,
            deduplicated = report.components_deduplicated,
            relations = report.relations_added,
            "chunk merged"
        );

        diagnostics.components_dropped += extraction.components_dropped;
        diagnostics.relations_dropped += extraction.relations_dropped + report.relations_dropped;
        diagnostics.components_deduplicated += report.components_deduplicated;
    }

    /// Run one engine call under the per-call timeout, retrying with
    /// exponential backoff up to the configured limit.
    ///
    /// Returns the final error and the number of attempts made.
    async fn call_with_retry<T, Fut>(
        &self,
        make_call: impl Fn() -> Fut,
    ) -> std::result::Result<T, (ExtractionError, usize)>
    where
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let outcome = match tokio::time::timeout(self.config.call_timeout, make_call()).await {
                Ok(result) => result,
                Err(_) => Err(ExtractionError::Timeout {
                    elapsed_ms: self.config.call_timeout.as_millis() as u64,
                }),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempts <= self.config.retry_limit => {
                    let delay = backoff_delay(attempts);
                    debug!(attempt = attempts, delay_ms = delay.as_millis() as u64, error = %error, "engine call failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err((error, attempts)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEngine;
    use crate::types::component::ComponentType;
    use std::time::Duration;

    fn quick_config() -> PipelineConfig {
        PipelineConfig::new()
            .with_retry_limit(1)
            .with_call_timeout(Duration::from_secs(5))
    }

    #[test]
    fn test_backoff_delay_doubles_then_saturates() {
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3), Duration::from_millis(2000));
        for attempt in 1..200 {
            assert!(backoff_delay(attempt) <= backoff_delay(attempt + 1));
        }
        // No shift overflow for arbitrarily large retry limits.
        assert_eq!(backoff_delay(1000), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[tokio::test]
    async fn test_empty_document_short_circuits() {
        let pipeline = Pipeline::with_config(MockEngine::new(), quick_config());
        let outcome = pipeline.run(&[]).await.unwrap();

        assert_eq!(outcome.graph.node_count(), 0);
        assert_eq!(outcome.diagnostics.chunks_planned, 0);
        assert!(pipeline.engine().component_calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_page_sequence_fails_fast() {
        let pipeline = Pipeline::with_config(MockEngine::new(), quick_config());
        let pages = vec![Page::new(1, "one"), Page::new(3, "three")];

        let err = pipeline.run(&pages).await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidPages { .. }));
        assert!(pipeline.engine().component_calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_chunk_assembly() {
        let engine = MockEngine::new()
            .with_component_response(vec![
                RawComponent::new("Claim", "we argue the approach works", 1),
                RawComponent::new("Evidence", "benchmarks show a 15% gain", 1),
            ])
            .with_relation_response(vec![RawRelation::new("P1-E1", "P1-C1", "supported_by")]);

        let pipeline = Pipeline::with_config(engine, quick_config());
        let outcome = pipeline.run(&[Page::new(1, "page text")]).await.unwrap();

        assert_eq!(outcome.graph.node_count(), 2);
        assert_eq!(outcome.graph.edge_count(), 1);
        assert_eq!(outcome.diagnostics.chunks_processed, 1);
        assert!(outcome.diagnostics.failed_chunks.is_empty());

        let claims = outcome.graph.nodes_by_type(ComponentType::Claim);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].id, "P1-C1");
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let engine = MockEngine::new()
            .fail_component_calls(1)
            .with_component_response(vec![RawComponent::new("Claim", "recovered", 1)])
            .with_relation_response(vec![]);

        let pipeline = Pipeline::with_config(engine, quick_config().with_retry_limit(2));

        tokio::time::pause();
        let outcome = pipeline.run(&[Page::new(1, "text")]).await.unwrap();
        assert_eq!(outcome.graph.node_count(), 1);
        assert!(outcome.diagnostics.failed_chunks.is_empty());
        assert_eq!(pipeline.engine().component_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_chunk_skipped_run_continues() {
        // Two chunks of one page each; every component call fails, so
        // both chunks are skipped but the run still succeeds.
        let engine = MockEngine::new().fail_component_calls(100);
        let config = quick_config()
            .with_base_pages_per_chunk(1)
            .with_max_pages_per_chunk(1)
            .with_retry_limit(1);
        let pipeline = Pipeline::with_config(engine, config);

        tokio::time::pause();
        let outcome = pipeline
            .run(&[Page::new(1, "one"), Page::new(2, "two")])
            .await
            .unwrap();

        assert_eq!(outcome.graph.node_count(), 0);
        assert_eq!(outcome.diagnostics.failed_chunks.len(), 2);
        assert_eq!(outcome.diagnostics.failed_chunks[0].attempts, 2);
        assert_eq!(outcome.diagnostics.chunks_processed, 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_chunk() {
        let pipeline = Pipeline::with_config(MockEngine::new(), quick_config());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pipeline
            .run_with_cancel(&[Page::new(1, "text")], cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Cancelled));
        assert!(pipeline.engine().component_calls().is_empty());
    }
}
