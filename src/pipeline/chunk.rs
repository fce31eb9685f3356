//! Chunk planning - partition the page sequence into extraction units.
//!
//! Chunk size scales with document length so the number of engine
//! invocations grows sub-linearly: a 10-page paper gets small chunks with
//! tight context, a 300-page report gets wide ones.

use crate::types::config::PipelineConfig;
use crate::types::page::Page;

/// Pages of the document scaled into one extra chunk page.
const GROWTH_DIVISOR: usize = 10;

/// A contiguous page range processed in one pair of engine calls.
///
/// Ephemeral: produced by the planner, consumed once by the run loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Index of the first page in the input slice
    pub start: usize,

    /// One past the index of the last page
    pub end: usize,

    /// Inclusive [min, max] page numbers covered
    pub page_range: (u32, u32),

    /// Advisory component count cap for the engine
    pub target_components: usize,

    /// Advisory relation count cap for the engine
    pub target_relations: usize,
}

impl Chunk {
    /// Number of pages in this chunk.
    pub fn page_count(&self) -> usize {
        self.end - self.start
    }

    /// The pages this chunk covers.
    pub fn pages<'a>(&self, pages: &'a [Page]) -> &'a [Page] {
        &pages[self.start..self.end]
    }

    /// Combined chunk text with page separators.
    pub fn combined_text(&self, pages: &[Page]) -> String {
        let mut combined = String::new();
        for page in self.pages(pages) {
            combined.push_str(&format!(
                "\n--- PAGE {} ---\n{}\n",
                page.page_number,
                page.text.trim()
            ));
        }
        combined
    }
}

/// Adaptive chunk size for a document of `total_pages`.
///
/// Non-decreasing in `total_pages`, clamped to
/// `[base_pages_per_chunk, max_pages_per_chunk]`.
pub fn pages_per_chunk(total_pages: usize, config: &PipelineConfig) -> usize {
    let scaled = config.base_pages_per_chunk + total_pages / GROWTH_DIVISOR;
    scaled.min(config.max_pages_per_chunk)
}

/// Partition `pages` into an ordered list of chunks.
///
/// The resulting page ranges cover the whole input with no gaps and no
/// overlaps; a page is never split across chunks. An empty input yields
/// an empty plan.
pub fn plan_chunks(pages: &[Page], config: &PipelineConfig) -> Vec<Chunk> {
    if pages.is_empty() {
        return Vec::new();
    }

    let size = pages_per_chunk(pages.len(), config);
    let mut chunks = Vec::with_capacity(pages.len().div_ceil(size));

    let mut start = 0;
    while start < pages.len() {
        let end = (start + size).min(pages.len());
        let page_count = end - start;

        let target_components = ((config.components_per_page * page_count as f32).round()
            as usize)
            .clamp(config.min_components_per_chunk, config.max_components_per_chunk);
        let target_relations =
            (target_components as f32 * config.relationship_density_factor).round() as usize;

        chunks.push(Chunk {
            start,
            end,
            page_range: (pages[start].page_number, pages[end - 1].page_number),
            target_components,
            target_relations,
        });

        start = end;
    }

    chunks
}
