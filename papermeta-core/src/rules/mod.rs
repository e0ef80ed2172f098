// Main rules module - delegates to semantic sub-modules
// This file coordinates the rule system but actual implementations are in:
// - engine.rs: RuleEngine, the ExtractionRule trait and shared utilities
// - name_matcher.rs: Person-name heuristic shared by the author rule
// - title_detection.rs: Largest-font title on the first page
// - date_detection.rs: Received/accepted/published line
// - author_detection.rs: Name-like spans between title and date line

pub mod author_detection;
pub mod date_detection;
pub mod engine;
pub mod name_matcher;
pub mod title_detection;

pub use author_detection::AuthorDetectionRule;
pub use date_detection::{parse_dates, DateDetectionRule};
pub use engine::*;
pub use name_matcher::NameMatcher;
pub use title_detection::TitleDetectionRule;
