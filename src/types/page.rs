//! Page input records from the ingestion layer.
//!
//! Pages are owned by the caller and read-only to the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, Result};

/// A single document page as delivered by the ingestion layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub page_number: u32,

    /// Extracted page text
    pub text: String,

    /// Tabular content, opaque to the pipeline
    #[serde(default)]
    pub tables: Vec<serde_json::Value>,

    /// Text statistics, opaque to the pipeline
    #[serde(default)]
    pub text_stats: Option<TextStats>,
}

impl Page {
    /// Create a new page.
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            tables: Vec::new(),
            text_stats: None,
        }
    }

    /// Attach text statistics.
    pub fn with_stats(mut self, stats: TextStats) -> Self {
        self.text_stats = Some(stats);
        self
    }

    /// Attach tabular content.
    pub fn with_tables(mut self, tables: impl IntoIterator<Item = serde_json::Value>) -> Self {
        self.tables.extend(tables);
        self
    }
}

/// Statistics about a page's text, computed by the ingestion layer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TextStats {
    pub word_count: usize,
    pub char_count: usize,
    pub line_count: usize,
    pub table_count: usize,
}

/// Fail-fast check on the input page sequence.
///
/// Pages must be numbered 1..=P contiguously. This is the only condition
/// that aborts a run before any chunk is planned.
pub fn check_page_sequence(pages: &[Page]) -> Result<()> {
    for (i, page) in pages.iter().enumerate() {
        let expected = i as u32 + 1;
        if page.page_number == 0 {
            return Err(ExtractionError::InvalidPages {
                reason: format!("page at index {} has non-positive number", i),
            });
        }
        if page.page_number != expected {
            return Err(ExtractionError::InvalidPages {
                reason: format!(
                    "expected page {} at index {}, found page {}",
                    expected, i, page.page_number
                ),
            });
        }
    }
    Ok(())
}
