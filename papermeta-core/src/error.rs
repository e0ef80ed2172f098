//! Error types for papermeta-core.
//!
//! Stage-level faults never surface here: rules report them through
//! `anyhow::Result` and the engine isolates them. These enums cover the
//! document-level failures that abort one document's record.

use crate::tree::NodeId;
use crate::types::ContextKey;
use thiserror::Error;

/// Violations of the arena tree invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A node was attached to a parent index that does not exist yet.
    #[error("unknown parent node {parent} (tree has {len} nodes)")]
    UnknownParent { parent: NodeId, len: usize },

    /// Text nodes are leaves and cannot own children.
    #[error("node {0} is a text node and cannot have children")]
    TextNodeParent(NodeId),

    /// The arena has no node 0 or node 0 has a parent.
    #[error("tree has no root node")]
    MissingRoot,

    /// A non-root node whose parent is absent or not an earlier node.
    #[error("node {node} has invalid parent {parent:?}")]
    InvalidParent { node: NodeId, parent: Option<NodeId> },

    /// A child index that is out of range or does not point back at its parent.
    #[error("node {node} lists invalid child {child}")]
    InvalidChild { node: NodeId, child: NodeId },
}

/// Failures while turning converter markup into a styled tree.
#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("markup reading error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Geometry and font-size declarations must be given in `px`.
    #[error("unknown {property} unit: {value}")]
    UnsupportedUnit { property: String, value: String },

    #[error("malformed style declaration: {0}")]
    MalformedStyle(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// A per-document failure. The orchestrator records it against the document
/// and moves on; it never stops other documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("pipeline error: {0}")]
    Pipeline(String),
}

/// A stage fault raised after the stage already located its anchor. The
/// engine still merges `context` before reporting the failure.
#[derive(Error, Debug)]
#[error("{error:#}")]
pub struct PartialExtraction {
    pub context: Vec<(ContextKey, i64)>,
    pub error: anyhow::Error,
}

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;
