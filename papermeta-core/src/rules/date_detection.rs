use super::engine::{page_spans, ExtractionRule};
use crate::config::ExtractionConfig;
use crate::error::PartialExtraction;
use crate::tree::{attrs, StyledTree};
use crate::types::*;
use anyhow::{anyhow, Result};
use indexmap::IndexMap;

pub const RECEIVED: &str = "received";
pub const ACCEPTED: &str = "accepted";
pub const PUBLISHED: &str = "published";

/// Finds the "Received: ... / Accepted: ... / Published: ..." line on the first
/// page. Contributes the line's top position and font size, which bound the
/// author block from below.
pub struct DateDetectionRule {
    keywords: Vec<String>,
    span_tag: String,
    first_page: String,
}

impl DateDetectionRule {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            keywords: config
                .dates
                .keywords
                .iter()
                .map(|keyword| keyword.to_lowercase())
                .collect(),
            span_tag: config.title.span_tag.clone(),
            first_page: config.first_page.clone(),
        }
    }

    fn matching_keyword(&self, content: &str) -> Option<&str> {
        let lowered = content.trim().to_lowercase();
        self.keywords
            .iter()
            .find(|keyword| lowered.starts_with(keyword.as_str()))
            .map(String::as_str)
    }
}

impl ExtractionRule for DateDetectionRule {
    fn name(&self) -> &str {
        "dates"
    }

    fn field(&self) -> FieldName {
        FieldName::multi(&[RECEIVED, ACCEPTED, PUBLISHED])
    }

    fn provides(&self) -> &[ContextKey] {
        &[ContextKey::DateStart, ContextKey::DateSize]
    }

    fn apply(&self, tree: &StyledTree, _context: &ExtractionContext) -> Result<ExtractionResult> {
        for id in page_spans(tree, &self.span_tag, &self.first_page) {
            let content = tree.text(id);
            let Some(keyword) = self.matching_keyword(&content) else {
                continue;
            };

            // The span may hold more than the date line
            let trimmed = content.trim();
            let line = trimmed
                .split('\n')
                .find(|line| line.to_lowercase().starts_with(keyword))
                .unwrap_or(trimmed);

            let top = tree.resolve_as::<i64>(id, attrs::TOP);
            let font_size = tree.resolve_as::<i64>(id, attrs::FONT_SIZE);
            log::debug!("   Date line at node {} (top {:?}): {}", id, top, line);

            // The anchor bounds the author block even when the line is malformed
            let anchor: Vec<(ContextKey, i64)> = [
                (ContextKey::DateStart, top),
                (ContextKey::DateSize, font_size),
            ]
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect();

            let dates = parse_dates(line).map_err(|error| PartialExtraction {
                context: anchor.clone(),
                error,
            })?;

            return Ok(ExtractionResult::Found(Extraction {
                value: FieldValue::mapping(dates),
                context: anchor,
            }));
        }

        Ok(ExtractionResult::InsufficientEvidence(self.field()))
    }
}

/// Split a date line on `/` into phases.
///
/// Each segment is classified by its prefix; anything that is neither
/// received nor accepted counts as published. The value is the text after the
/// first `:`. A later segment of the same phase replaces an earlier one.
pub fn parse_dates(line: &str) -> Result<IndexMap<String, String>> {
    let mut dates = IndexMap::new();

    for segment in line.split('/').map(str::trim) {
        let lowered = segment.to_lowercase();
        let phase = if lowered.starts_with(RECEIVED) {
            RECEIVED
        } else if lowered.starts_with(ACCEPTED) {
            ACCEPTED
        } else {
            PUBLISHED
        };

        let (_, value) = segment
            .split_once(':')
            .ok_or_else(|| anyhow!("date segment '{}' has no ':' separator", segment))?;
        dates.insert(phase.to_string(), value.trim().to_string());
    }

    Ok(dates)
}
