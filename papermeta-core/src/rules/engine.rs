use crate::config::ExtractionConfig;
use crate::error::PartialExtraction;
use crate::tree::{attrs, NodeId, StyledTree};
use crate::types::*;
use anyhow::{bail, Result};
use regex::Regex;
use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

// Import rule types
use super::author_detection::AuthorDetectionRule;
use super::date_detection::DateDetectionRule;
use super::title_detection::TitleDetectionRule;

// Unicode space separators plus newline/tab, collapsed when normalizing text
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n\t\p{Zs}]+").unwrap());

// Debug configuration for pipeline tracing
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub filter_patterns: Vec<String>,
}

impl DebugConfig {
    pub fn new(enabled: bool, filter_patterns: Vec<String>) -> Self {
        Self {
            enabled,
            filter_patterns,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            filter_patterns: Vec::new(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.filter_patterns.iter().any(|pattern| {
            // Try regex first, fall back to simple string contains
            if let Ok(regex) = Regex::new(pattern) {
                regex.is_match(text)
            } else {
                text.contains(pattern)
            }
        })
    }
}

/// Debug utility function to trace extracted values through the pipeline
pub fn debug_pipeline_value(rule_name: &str, value: &FieldValue, debug_config: &DebugConfig) {
    if !debug_config.enabled || debug_config.filter_patterns.is_empty() {
        return;
    }

    let mut leaves = Vec::new();
    collect_text_leaves(value, &mut leaves);

    let matching: Vec<&str> = leaves
        .into_iter()
        .filter(|text| debug_config.matches(text))
        .collect();

    if !matching.is_empty() {
        log::debug!("🔍 [{}] {} matching values:", rule_name, matching.len());
        for text in matching {
            let preview: String = text.chars().take(50).collect();
            log::debug!("  \"{}\"", preview);
        }
    }
}

fn collect_text_leaves<'a>(value: &'a FieldValue, leaves: &mut Vec<&'a str>) {
    match value {
        FieldValue::Scalar(Scalar::Str(text)) => leaves.push(text),
        FieldValue::Scalar(_) => {}
        FieldValue::Sequence(items) => items.iter().for_each(|item| collect_text_leaves(item, leaves)),
        FieldValue::Mapping(entries) => entries
            .values()
            .for_each(|item| collect_text_leaves(item, leaves)),
    }
}

// Extraction rule infrastructure
//
// A rule is a pure function (tree, context) -> result. It declares which
// context keys it reads and which it contributes; the engine only hands it the
// keys it declared and only merges back the keys it promised.
pub trait ExtractionRule {
    fn name(&self) -> &str;

    /// Record field(s) the rule's value is stored under.
    fn field(&self) -> FieldName;

    /// Context keys this rule reads. Each must be provided by an earlier rule.
    fn requires(&self) -> &[ContextKey] {
        &[]
    }

    /// Context keys this rule contributes, on success or through a
    /// [`PartialExtraction`] failure.
    fn provides(&self) -> &[ContextKey] {
        &[]
    }

    /// `Ok(Found)` with a value, `Ok(InsufficientEvidence)` when the heuristic
    /// cannot find its field, `Err` for anything unexpected.
    fn apply(&self, tree: &StyledTree, context: &ExtractionContext) -> Result<ExtractionResult>;
}

/// Result of running every stage over one document.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Successful stage values, in pipeline order.
    pub fields: Vec<(FieldName, FieldValue)>,
    pub context: ExtractionContext,
    pub stages: Vec<StageReport>,
}

pub struct RuleEngine {
    rules: Vec<Box<dyn ExtractionRule>>,
    debug_config: DebugConfig,
    pub rule_timings: RefCell<Vec<(String, Duration)>>,
}

impl RuleEngine {
    /// Build the pipeline declared in `config.pipeline`, in order.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let mut rules: Vec<Box<dyn ExtractionRule>> = Vec::new();

        for rule_config in &config.pipeline.rules {
            if !rule_config.enabled {
                log::info!("   ⏭️  Skipping disabled rule: {}", rule_config.name);
                continue;
            }

            match Self::build_rule(&rule_config.name, config) {
                Some(rule) => rules.push(rule),
                None => bail!(
                    "unknown rule '{}' (expected one of: title, dates, authors)",
                    rule_config.name
                ),
            }
        }

        Self::with_rules(rules)
    }

    /// Build an engine from explicit rules, checking the declared order.
    pub fn with_rules(rules: Vec<Box<dyn ExtractionRule>>) -> Result<Self> {
        Self::validate_order(&rules)?;

        Ok(Self {
            rules,
            debug_config: DebugConfig::disabled(),
            rule_timings: RefCell::new(Vec::new()),
        })
    }

    fn build_rule(name: &str, config: &ExtractionConfig) -> Option<Box<dyn ExtractionRule>> {
        match name {
            "title" => Some(Box::new(TitleDetectionRule::new(config))),
            "dates" => Some(Box::new(DateDetectionRule::new(config))),
            "authors" => Some(Box::new(AuthorDetectionRule::new(config))),
            _ => None,
        }
    }

    /// Every context key a rule reads must be provided by a rule before it.
    pub fn validate_order(rules: &[Box<dyn ExtractionRule>]) -> Result<()> {
        let mut provided: Vec<ContextKey> = Vec::new();

        for rule in rules {
            for key in rule.requires() {
                if !provided.contains(key) {
                    bail!(
                        "rule '{}' reads context '{}' but no earlier rule provides it",
                        rule.name(),
                        key
                    );
                }
            }
            provided.extend_from_slice(rule.provides());
        }

        Ok(())
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.debug_config = debug_config;
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Run every rule in order over one document's tree.
    ///
    /// Stage failures never abort the run: insufficient evidence and
    /// unexpected faults (errors or panics) are reported and the next stage
    /// proceeds with whatever context earlier stages produced.
    pub fn run(&self, document: &str, tree: &StyledTree) -> PipelineOutput {
        let mut context = ExtractionContext::new();
        let mut fields = Vec::new();
        let mut stages = Vec::new();

        // Clear previous timings
        self.rule_timings.borrow_mut().clear();

        for rule in &self.rules {
            log::info!("🔧 Applying rule: {}", rule.name());
            let rule_start = Instant::now();

            let scoped = context.scoped(rule.requires());
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.apply(tree, &scoped)));

            let status = match outcome {
                Ok(Ok(ExtractionResult::Found(extraction))) => {
                    merge_context(rule.as_ref(), &mut context, &extraction.context);
                    debug_pipeline_value(rule.name(), &extraction.value, &self.debug_config);
                    fields.push((rule.field(), extraction.value));
                    StageStatus::Extracted
                }
                Ok(Ok(ExtractionResult::InsufficientEvidence(field))) => {
                    log::warn!("Can't find '{}' value in {}", field, document);
                    StageStatus::Absent
                }
                Ok(Err(err)) => {
                    if let Some(partial) = err.downcast_ref::<PartialExtraction>() {
                        merge_context(rule.as_ref(), &mut context, &partial.context);
                    }
                    log::error!("❌ Error handling '{}' in {}: {:#}", rule.name(), document, err);
                    StageStatus::Failed(format!("{err:#}"))
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::error!("❌ Rule '{}' panicked in {}: {}", rule.name(), document, message);
                    StageStatus::Failed(message)
                }
            };

            let rule_duration = rule_start.elapsed();
            self.rule_timings
                .borrow_mut()
                .push((rule.name().to_string(), rule_duration));

            stages.push(StageReport {
                stage: rule.name().to_string(),
                field: rule.field(),
                status,
                duration_us: rule_duration.as_micros() as u64,
            });
        }

        PipelineOutput {
            fields,
            context,
            stages,
        }
    }
}

// Only keys the rule declared in `provides()` land in the shared context
fn merge_context(
    rule: &dyn ExtractionRule,
    context: &mut ExtractionContext,
    updates: &[(ContextKey, i64)],
) {
    for &(key, value) in updates {
        if rule.provides().contains(&key) {
            context.set(key, value);
        } else {
            log::warn!(
                "⚠️  Rule '{}' wrote undeclared context '{}', ignored",
                rule.name(),
                key
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "rule panicked".to_string()
    }
}

// Shared utilities for rules

/// Collapse every run of Unicode spaces, newlines and tabs to one ASCII space
/// and trim both ends.
pub fn normalize_text(content: &str) -> String {
    WHITESPACE_RUN.replace_all(content.trim(), " ").into_owned()
}

/// A `span_tag` element tagged with page `page`.
pub fn is_page_span(tree: &StyledTree, id: NodeId, span_tag: &str, page: &str) -> bool {
    tree.node(id)
        .map(|node| node.is(span_tag) && node.get(attrs::PAGE) == Some(page))
        .unwrap_or(false)
}

/// Page-one spans in document order.
pub fn page_spans<'a>(
    tree: &'a StyledTree,
    span_tag: &'a str,
    page: &'a str,
) -> impl Iterator<Item = NodeId> + 'a {
    tree.elements()
        .filter(move |id| is_page_span(tree, *id, span_tag, page))
}
