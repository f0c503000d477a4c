//! Core type definitions for the document model
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for child lists (most nodes have <4 children)
//! 3. Element-only data (attributes, inline style) lives on the node itself,
//!    so there is one node struct and no downcasting

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::style::CssStyleDeclaration;

/// Node identifier (index into arena)
pub type NodeId = u32;

/// Node type matching DOM specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CdataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            2 => Some(NodeType::Attribute),
            3 => Some(NodeType::Text),
            4 => Some(NodeType::CdataSection),
            5 => Some(NodeType::EntityReference),
            6 => Some(NodeType::Entity),
            7 => Some(NodeType::ProcessingInstruction),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            10 => Some(NodeType::DocumentType),
            11 => Some(NodeType::DocumentFragment),
            12 => Some(NodeType::Notation),
            _ => None,
        }
    }

    /// Whether nodes of this type may hold children
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeType::Element | NodeType::Document | NodeType::DocumentFragment
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// `document.readyState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadyState::Loading => "loading",
            ReadyState::Interactive => "interactive",
            ReadyState::Complete => "complete",
        }
    }

    /// The parser has finished: `interactive` or `complete`
    pub fn is_parsed(self) -> bool {
        self >= ReadyState::Interactive
    }

    pub(crate) fn next(self) -> Option<Self> {
        match self {
            ReadyState::Loading => Some(ReadyState::Interactive),
            ReadyState::Interactive => Some(ReadyState::Complete),
            ReadyState::Complete => None,
        }
    }
}

impl Default for ReadyState {
    fn default() -> Self {
        ReadyState::Complete
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which listener API the host exposes.
///
/// A standard host has `addEventListener`/`removeEventListener` and fires
/// `DOMContentLoaded`. A legacy host only has `attachEvent`/`detachEvent`
/// with `on`-prefixed handler names and signals readiness through
/// `readystatechange` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventModel {
    Standard,
    Legacy,
}

impl Default for EventModel {
    fn default() -> Self {
        EventModel::Standard
    }
}

/// Single element attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// The main DOM tree node structure
///
/// Attributes keep insertion order so serialization is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    pub node_id: NodeId,
    pub node_type: NodeType,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>,

    pub node_name: String,
    pub node_value: String,
    pub attributes: Vec<Attribute>,

    /// `element.style`; `None` for anything that is not an element
    pub style: Option<CssStyleDeclaration>,
}

impl DomNode {
    fn with_type(node_type: NodeType, node_name: String) -> Self {
        Self {
            node_id: 0,
            node_type,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name,
            node_value: String::new(),
            attributes: Vec::new(),
            style: None,
        }
    }

    /// Create an element node. HTML documents report upper-cased node names.
    pub fn element(tag_name: &str) -> Self {
        let mut node = Self::with_type(NodeType::Element, tag_name.to_ascii_uppercase());
        node.style = Some(CssStyleDeclaration::new());
        node
    }

    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::with_type(NodeType::Text, "#text".to_string());
        node.node_value = content.into();
        node
    }

    pub fn comment(content: impl Into<String>) -> Self {
        let mut node = Self::with_type(NodeType::Comment, "#comment".to_string());
        node.node_value = content.into();
        node
    }

    pub fn document() -> Self {
        Self::with_type(NodeType::Document, "#document".to_string())
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.node_type == NodeType::Element {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, keeping `style` and the declaration block in sync
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();

        if name == "style" {
            if let Some(style) = self.style.as_mut() {
                style.set_css_text(&value);
            }
        }

        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|a| a.name == name)?;

        if name == "style" {
            if let Some(style) = self.style.as_mut() {
                style.set_css_text("");
            }
        }

        Some(self.attributes.remove(index).value)
    }
}
