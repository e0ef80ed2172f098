// Preprocessor abstraction for document processing
//
// This module defines the boundary between layout conversion (done by an
// external converter: PDF -> markup) and metadata extraction (StyledTree ->
// Record). Everything after this point works with StyledTree and is
// converter-agnostic.

use crate::error::{DocumentError, MarkupError};
use crate::tree::StyledTree;
use std::path::Path;

/// Preprocessor trait - converts converter markup into a StyledTree
///
/// Implementations own the markup dialect: reading it, flattening inline
/// styling onto nodes and assigning page indices, so that the heuristics
/// only ever see normalized attributes.
pub trait Preprocessor {
    /// Parse markup (HTML, XHTML, ...) into a styled tree.
    fn parse_markup(&self, markup: &str) -> Result<StyledTree, MarkupError>;

    /// Convenience method: Process from file path
    ///
    /// Reads the converter output and parses it.
    fn process_file(&self, input: &Path) -> Result<StyledTree, DocumentError> {
        let markup = std::fs::read_to_string(input)?;
        Ok(self.parse_markup(&markup)?)
    }

    /// Get preprocessor name for debugging/logging
    fn name(&self) -> &str;

    /// Check if preprocessor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}
