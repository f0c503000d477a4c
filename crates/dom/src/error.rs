//! Error types for DOM operations
//!
//! Flat hierarchy. Variants are named after the DOMException they stand for.

use thiserror::Error;

use crate::types::NodeId;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Invalid character in name: {0:?}")]
    InvalidCharacter(String),

    #[error("Node {child} is not a child of node {parent}")]
    NotFound { parent: NodeId, child: NodeId },

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not supported by this host: {0}")]
    NotSupported(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
