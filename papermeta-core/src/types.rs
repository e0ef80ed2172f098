use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ===== FIELD VALUES =====

/// The record key(s) a stage fills.
///
/// `Multi` lets one stage populate several top-level fields at once (dates
/// fills `received`, `accepted` and `published`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldName {
    Single(String),
    Multi(Vec<String>),
}

impl FieldName {
    pub fn single(name: &str) -> Self {
        Self::Single(name.to_string())
    }

    pub fn multi(names: &[&str]) -> Self {
        Self::Multi(names.iter().map(|name| name.to_string()).collect())
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldName::Single(name) => write!(f, "{name}"),
            FieldName::Multi(names) => write!(f, "({})", names.join(", ")),
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Int(value) => write!(f, "{value}"),
            Scalar::Float(value) => write!(f, "{value}"),
            Scalar::Str(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Nested extraction value. Recursive values must not be built; nothing
/// guards against them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(Scalar),
    Sequence(Vec<FieldValue>),
    Mapping(IndexMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(Scalar::Str(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            FieldValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::Sequence(items)
    }
}

impl From<IndexMap<String, FieldValue>> for FieldValue {
    fn from(entries: IndexMap<String, FieldValue>) -> Self {
        FieldValue::Mapping(entries)
    }
}

impl FieldValue {
    pub fn sequence<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FieldValue>,
    {
        FieldValue::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn mapping<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        FieldValue::Mapping(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Nested per-document record: field name -> value. Always carries `document`.
pub type Record = IndexMap<String, FieldValue>;

/// Flat per-document row: column name -> cell.
pub type Row = IndexMap<String, Scalar>;

/// Record key holding the document identifier.
pub const DOCUMENT_FIELD: &str = "document";

// ===== EXTRACTION CONTEXT =====

/// Keys of the state shared between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextKey {
    /// Font size of the detected title; upper bound for author spans.
    TitleSize,
    /// Vertical position of the date line; authors sit above it.
    DateStart,
    /// Font size of the date line; lower bound for author spans.
    DateSize,
}

impl ContextKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKey::TitleSize => "title-size",
            ContextKey::DateStart => "date-start",
            ContextKey::DateSize => "date-size",
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-document state accumulated across stages. Built fresh for every
/// document and dropped after the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionContext {
    values: BTreeMap<ContextKey, i64>,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ContextKey) -> Option<i64> {
        self.values.get(&key).copied()
    }

    pub fn contains(&self, key: ContextKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn set(&mut self, key: ContextKey, value: i64) {
        self.values.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy holding only `keys`. Stages receive this view so that they can
    /// only read what they declared.
    pub fn scoped(&self, keys: &[ContextKey]) -> Self {
        Self {
            values: self
                .values
                .iter()
                .filter(|(key, _)| keys.contains(key))
                .map(|(key, value)| (*key, *value))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContextKey, i64)> + '_ {
        self.values.iter().map(|(key, value)| (*key, *value))
    }
}

// ===== STAGE RESULTS =====

/// A value found by a stage, plus the context it contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub value: FieldValue,
    pub context: Vec<(ContextKey, i64)>,
}

impl Extraction {
    pub fn new(value: impl Into<FieldValue>) -> Self {
        Self {
            value: value.into(),
            context: Vec::new(),
        }
    }

    /// Contribute `key` to the context; a `None` value contributes nothing.
    pub fn with_context(mut self, key: ContextKey, value: Option<i64>) -> Self {
        if let Some(value) = value {
            self.context.push((key, value));
        }
        self
    }
}

/// Outcome of one stage that did not fail unexpectedly.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Found(Extraction),
    /// The heuristic's preconditions are not met in this document.
    InsufficientEvidence(FieldName),
}

impl ExtractionResult {
    pub fn is_found(&self) -> bool {
        matches!(self, ExtractionResult::Found(_))
    }

    pub fn value(&self) -> Option<&FieldValue> {
        match self {
            ExtractionResult::Found(extraction) => Some(&extraction.value),
            ExtractionResult::InsufficientEvidence(_) => None,
        }
    }
}

// ===== REPORTING =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum StageStatus {
    Extracted,
    /// Insufficient evidence; the field is omitted.
    Absent,
    /// Unexpected fault, caught and reported.
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub field: FieldName,
    #[serde(flatten)]
    pub status: StageStatus,
    pub duration_us: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub document: String,
    pub processed_at: DateTime<Utc>,
    pub stages: Vec<StageReport>,
}

impl DocumentReport {
    pub fn new(document: &str) -> Self {
        Self {
            document: document.to_string(),
            processed_at: Utc::now(),
            stages: Vec::new(),
        }
    }

    pub fn extracted(&self) -> usize {
        self.stages
            .iter()
            .filter(|stage| stage.status == StageStatus::Extracted)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StageReport> {
        self.stages
            .iter()
            .filter(|stage| matches!(stage.status, StageStatus::Failed(_)))
    }
}

/// Everything produced for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub record: Record,
    pub row: Row,
    pub report: DocumentReport,
}
