//! Configuration for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ExtractionError, Result};

/// Retention policy for the carry-over context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextPolicy {
    /// Most recent pages first, ties broken by relation degree.
    ///
    /// Favors discovering relations between adjacent-chunk content,
    /// the dominant case.
    Recency,

    /// Most connected components first, ties broken by recency.
    Connectivity,
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self::Recency
    }
}

/// Sizing and behavior knobs for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Chunk size floor in pages
    pub base_pages_per_chunk: usize,

    /// Chunk size ceiling in pages
    pub max_pages_per_chunk: usize,

    /// Expected component yield per page, drives the advisory target
    pub components_per_page: f32,

    /// Advisory component target floor per chunk
    pub min_components_per_chunk: usize,

    /// Advisory component target ceiling per chunk
    pub max_components_per_chunk: usize,

    /// Target relations = target components × this factor
    pub relationship_density_factor: f32,

    /// Out-degree cap enforced at the port boundary
    pub max_relationships_per_component: usize,

    /// Component cap for the context window
    pub context_max_components: usize,

    /// Relation cap for the context window
    pub context_max_relations: usize,

    /// Context retention policy
    #[serde(default)]
    pub context_policy: ContextPolicy,

    /// Retries per engine call after the first attempt
    pub retry_limit: usize,

    /// Independent timeout for each engine call
    #[serde(with = "duration_millis")]
    pub call_timeout: Duration,

    /// Word-overlap (Jaccard) threshold above which two same-page,
    /// same-type components are considered duplicates
    pub dedup_overlap_threshold: f32,

    /// Chunks processed concurrently per batch; 1 = strict sequential fold
    pub max_parallel_chunks: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_pages_per_chunk: 5,
            max_pages_per_chunk: 35,
            components_per_page: 3.0,
            min_components_per_chunk: 5,
            max_components_per_chunk: 40,
            relationship_density_factor: 0.8,
            max_relationships_per_component: 5,
            context_max_components: 25,
            context_max_relations: 25,
            context_policy: ContextPolicy::default(),
            retry_limit: 3,
            call_timeout: Duration::from_secs(60),
            dedup_overlap_threshold: 0.6,
            max_parallel_chunks: 1,
        }
    }
}

impl PipelineConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base chunk size in pages.
    pub fn with_base_pages_per_chunk(mut self, pages: usize) -> Self {
        self.base_pages_per_chunk = pages;
        self
    }

    /// Set the chunk size ceiling in pages.
    pub fn with_max_pages_per_chunk(mut self, pages: usize) -> Self {
        self.max_pages_per_chunk = pages;
        self
    }

    /// Set the context window caps.
    pub fn with_context_caps(mut self, components: usize, relations: usize) -> Self {
        self.context_max_components = components;
        self.context_max_relations = relations;
        self
    }

    /// Set the context retention policy.
    pub fn with_context_policy(mut self, policy: ContextPolicy) -> Self {
        self.context_policy = policy;
        self
    }

    /// Set the retry limit.
    pub fn with_retry_limit(mut self, retries: usize) -> Self {
        self.retry_limit = retries;
        self
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set the out-degree cap.
    pub fn with_max_relationships_per_component(mut self, cap: usize) -> Self {
        self.max_relationships_per_component = cap;
        self
    }

    /// Set the duplicate-overlap threshold.
    pub fn with_dedup_overlap_threshold(mut self, threshold: f32) -> Self {
        self.dedup_overlap_threshold = threshold;
        self
    }

    /// Enable bounded-parallel chunk processing.
    pub fn with_max_parallel_chunks(mut self, chunks: usize) -> Self {
        self.max_parallel_chunks = chunks;
        self
    }

    /// Check the configuration for inconsistencies.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| {
            Err(ExtractionError::Config {
                reason: reason.to_string(),
            })
        };

        if self.base_pages_per_chunk == 0 {
            return fail("base_pages_per_chunk must be positive");
        }
        if self.max_pages_per_chunk < self.base_pages_per_chunk {
            return fail("max_pages_per_chunk must be >= base_pages_per_chunk");
        }
        if self.min_components_per_chunk > self.max_components_per_chunk {
            return fail("min_components_per_chunk must be <= max_components_per_chunk");
        }
        if !(0.0..=1.0).contains(&self.dedup_overlap_threshold) {
            return fail("dedup_overlap_threshold must be in [0, 1]");
        }
        if self.relationship_density_factor < 0.0 {
            return fail("relationship_density_factor must be non-negative");
        }
        if self.max_parallel_chunks == 0 {
            return fail("max_parallel_chunks must be positive");
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = PipelineConfig::new()
            .with_base_pages_per_chunk(3)
            .with_retry_limit(1)
            .with_context_caps(10, 10)
            .with_max_parallel_chunks(4);

        assert_eq!(config.base_pages_per_chunk, 3);
        assert_eq!(config.retry_limit, 1);
        assert_eq!(config.context_max_components, 10);
        assert_eq!(config.max_parallel_chunks, 4);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(PipelineConfig::new()
            .with_base_pages_per_chunk(0)
            .validate()
            .is_err());

        let inverted = PipelineConfig {
            base_pages_per_chunk: 10,
            max_pages_per_chunk: 5,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        assert!(PipelineConfig::new()
            .with_dedup_overlap_threshold(1.5)
            .validate()
            .is_err());

        assert!(PipelineConfig::new()
            .with_max_parallel_chunks(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_timeout_serde_round_trip() {
        let config = PipelineConfig::new().with_call_timeout(Duration::from_millis(1500));
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.call_timeout, Duration::from_millis(1500));
    }
}
