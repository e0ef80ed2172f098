use super::engine::{normalize_text, page_spans, ExtractionRule};
use crate::config::ExtractionConfig;
use crate::tree::{attrs, StyledTree};
use crate::types::*;
use anyhow::Result;

pub const TITLE_FIELD: &str = "title";

/// First page-one span whose resolved font size reaches the title threshold.
///
/// Only the page number usually precedes the title, so the first large span in
/// document order wins. Contributes the title's font size as the upper bound
/// for author spans.
pub struct TitleDetectionRule {
    min_font_size: i64,
    span_tag: String,
    first_page: String,
}

impl TitleDetectionRule {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            min_font_size: config.title.min_font_size,
            span_tag: config.title.span_tag.clone(),
            first_page: config.first_page.clone(),
        }
    }
}

impl ExtractionRule for TitleDetectionRule {
    fn name(&self) -> &str {
        "title"
    }

    fn field(&self) -> FieldName {
        FieldName::single(TITLE_FIELD)
    }

    fn provides(&self) -> &[ContextKey] {
        &[ContextKey::TitleSize]
    }

    fn apply(&self, tree: &StyledTree, _context: &ExtractionContext) -> Result<ExtractionResult> {
        for id in page_spans(tree, &self.span_tag, &self.first_page) {
            let Some(font_size) = tree.resolve_as::<i64>(id, attrs::FONT_SIZE) else {
                continue;
            };

            if font_size >= self.min_font_size {
                let title = normalize_text(&tree.text(id));
                log::debug!("   Title at node {} ({}px): {}", id, font_size, title);

                return Ok(ExtractionResult::Found(
                    Extraction::new(title).with_context(ContextKey::TitleSize, Some(font_size)),
                ));
            }
        }

        Ok(ExtractionResult::InsufficientEvidence(self.field()))
    }
}
