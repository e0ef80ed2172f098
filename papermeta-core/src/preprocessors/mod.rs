//! Document Preprocessors
//!
//! This module turns converter markup into the StyledTree the rules engine
//! consumes.
//!
//! ## Architecture
//!
//! ```text
//! PDF
//!     ↓
//! [External layout converter]
//!     ↓
//! Markup (positioned HTML)
//!     ↓
//! [Preprocessor]  inline styles, assign pages
//!     ↓
//! StyledTree
//!     ↓
//! [RuleEngine]
//!     ↓
//! Record + Row
//! ```
//!
//! ## Available Preprocessors
//!
//! - `HtmlPreprocessor` - positioned-box HTML from layout-aware converters

pub mod html;
pub mod preprocessor;

// Re-export main types
pub use html::HtmlPreprocessor;
pub use preprocessor::Preprocessor;
