// papermeta Core Library
//
// Extracts bibliographic metadata (title, authors, publication dates) from
// the styled layout tree of a converted scientific paper.
// Main interface for converting converter markup into records and rows.

pub mod config;
pub mod error;
pub mod flatten;
pub mod preprocessors;
pub mod processor;
pub mod rules;
pub mod tree;
pub mod types;

// Re-export main types and functions for easy use
pub use config::ExtractionConfig;
pub use error::{DocumentError, DocumentResult, MarkupError, TreeError};
pub use flatten::{store_field, RecordBuilder};
pub use preprocessors::{HtmlPreprocessor, Preprocessor};
pub use processor::{document_id, DocumentProcessor, StepProfiler};
pub use rules::{DebugConfig, ExtractionRule, RuleEngine};
pub use tree::{StyledTree, TreeBuilder};
pub use types::*;
