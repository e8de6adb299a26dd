//! Error types for the annotation core

use thiserror::Error;

use crate::dom::NodeId;

/// Tree operations that cannot be applied to the node they were given
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("node {0:?} is not a text node")]
    NotText(NodeId),

    #[error("node {0:?} is not an element")]
    NotElement(NodeId),

    #[error("node {0:?} has no parent")]
    Detached(NodeId),

    #[error("offsets {start}..{end} out of range for text of length {len}")]
    OffsetOutOfRange { start: usize, end: usize, len: usize },

    #[error("node {child:?} cannot be inserted under {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}

/// Failures reported by an annotation store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend failed: {0}")]
    Backend(String),

    #[error("stored groups could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures while turning markup into a tree
#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("markup is not well formed: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("markup has no root element")]
    MissingRoot,

    #[error(transparent)]
    Tree(#[from] DomError),
}

/// Rejected interaction requests
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("the {0} tool is not implemented")]
    NotImplemented(&'static str),

    #[error("colour {color} is not offered for the {tool} tool")]
    UnknownColor { tool: &'static str, color: String },
}
