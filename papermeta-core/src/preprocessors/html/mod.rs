//! HTML preprocessor
//!
//! Reads the positioned-box HTML produced by layout-aware PDF-to-HTML
//! converters.

pub mod html_parser;

use super::preprocessor::Preprocessor;
use crate::error::MarkupError;
use crate::tree::StyledTree;
use std::path::Path;

pub use html_parser::{inline_styles, parse_html, parse_style, read_tree};

#[derive(Debug, Clone, Default)]
pub struct HtmlPreprocessor;

impl HtmlPreprocessor {
    pub fn new() -> Self {
        Self
    }
}

impl Preprocessor for HtmlPreprocessor {
    fn parse_markup(&self, markup: &str) -> Result<StyledTree, MarkupError> {
        parse_html(markup)
    }

    fn name(&self) -> &str {
        "html"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_converter_output_names() {
        let preprocessor = HtmlPreprocessor::new();
        assert!(preprocessor.supports_file_type(Path::new("paper.pdf.html")));
        assert!(preprocessor.supports_file_type(Path::new("paper.HTM")));
        assert!(!preprocessor.supports_file_type(Path::new("paper.pdf")));
    }

    #[test]
    fn test_process_missing_file_is_io_error() {
        let preprocessor = HtmlPreprocessor::new();
        let err = preprocessor
            .process_file(Path::new("/nonexistent/papermeta/paper.html"))
            .unwrap_err();
        assert!(matches!(err, crate::error::DocumentError::Io(_)));
    }
}
