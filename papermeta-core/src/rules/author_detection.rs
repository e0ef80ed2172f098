use super::engine::{page_spans, ExtractionRule};
use super::name_matcher::NameMatcher;
use crate::config::ExtractionConfig;
use crate::tree::{attrs, StyledTree};
use crate::types::*;
use anyhow::Result;

pub const AUTHORS_FIELD: &str = "authors";

/// Name-like spans sitting above the date line, set in a font larger than the
/// date line and smaller than the title.
pub struct AuthorDetectionRule {
    matcher: NameMatcher,
    span_tag: String,
    first_page: String,
}

impl AuthorDetectionRule {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            matcher: NameMatcher::new(&config.authors.false_positives),
            span_tag: config.title.span_tag.clone(),
            first_page: config.first_page.clone(),
        }
    }
}

impl ExtractionRule for AuthorDetectionRule {
    fn name(&self) -> &str {
        "authors"
    }

    fn field(&self) -> FieldName {
        FieldName::single(AUTHORS_FIELD)
    }

    fn requires(&self) -> &[ContextKey] {
        &[ContextKey::DateStart, ContextKey::DateSize, ContextKey::TitleSize]
    }

    fn apply(&self, tree: &StyledTree, context: &ExtractionContext) -> Result<ExtractionResult> {
        let (Some(date_start), Some(date_size), Some(title_size)) = (
            context.get(ContextKey::DateStart),
            context.get(ContextKey::DateSize),
            context.get(ContextKey::TitleSize),
        ) else {
            log::debug!("   Author bounds incomplete: {:?}", context);
            return Ok(ExtractionResult::InsufficientEvidence(self.field()));
        };

        let mut authors = Vec::new();

        for id in page_spans(tree, &self.span_tag, &self.first_page) {
            let Some(top) = tree.resolve_as::<i64>(id, attrs::TOP) else {
                continue;
            };
            let Some(font_size) = tree.resolve_as::<i64>(id, attrs::FONT_SIZE) else {
                continue;
            };

            if top >= date_start || font_size <= date_size || font_size >= title_size {
                continue;
            }

            if let Some(name) = self.matcher.match_name(&tree.text(id)) {
                authors.push(name);
            }
        }

        if authors.is_empty() {
            return Ok(ExtractionResult::InsufficientEvidence(self.field()));
        }

        log::debug!("   Found {} author spans", authors.len());
        Ok(ExtractionResult::Found(Extraction::new(FieldValue::sequence(authors))))
    }
}
