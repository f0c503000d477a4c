//! Arena-based DOM tree storage
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```
//!
//! Nodes are never freed. A removed node stays in the arena, detached, so
//! callers holding its id can re-insert it later, the same way a script
//! can keep a reference to a node it took out of the document.

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

/// Arena allocator for DOM nodes
#[derive(Debug)]
pub struct DomArena {
    /// All nodes stored sequentially
    nodes: Vec<DomNode>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Add a node to the arena, returns its ID
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        self.nodes.push(node);
        node_id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID, failing unless it is an element
    pub fn element(&self, node_id: NodeId) -> Result<&DomNode> {
        let node = self.get(node_id)?;
        expect_element(node)?;
        Ok(node)
    }

    pub fn element_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        let node = self.get_mut(node_id)?;
        expect_element(node)?;
        Ok(node)
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Total number of nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over all nodes
    pub fn iter(&self) -> impl Iterator<Item = &DomNode> {
        self.nodes.iter()
    }

    /// Get children of a node
    pub fn children(&self, node_id: NodeId) -> Result<Vec<&DomNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Get parent of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// The node followed by each of its ancestors, innermost first
    pub fn ancestors(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let mut path = vec![node_id];
        let mut current = self.get(node_id)?.parent_id;

        while let Some(id) = current {
            path.push(id);
            current = self.get(id)?.parent_id;
        }

        Ok(path)
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> Result<bool> {
        Ok(self.ancestors(node)?.contains(&ancestor))
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// A child that already has a parent is moved, not copied.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_type = self.get(parent)?.node_type;
        let child_type = self.get(child)?.node_type;

        if !parent_type.is_container() {
            return Err(DomError::HierarchyRequest(format!(
                "{} node {} cannot have children",
                parent_type, parent
            )));
        }
        if child_type == NodeType::Document {
            return Err(DomError::HierarchyRequest(
                "a document cannot be inserted into a tree".to_string(),
            ));
        }
        if self.is_inclusive_ancestor(child, parent)? {
            return Err(DomError::HierarchyRequest(format!(
                "node {} is an ancestor of node {}",
                child, parent
            )));
        }

        self.detach(child)?;
        self.get_mut(parent)?.children_ids.push(child);
        self.get_mut(child)?.parent_id = Some(parent);
        Ok(())
    }

    /// Remove `child` from `parent`'s child list
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        if self.get(child)?.parent_id != Some(parent) {
            return Err(DomError::NotFound { parent, child });
        }
        self.detach(child)
    }

    /// Unlink a node from its parent, if it has one
    fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let Some(parent_id) = self.get(node_id)?.parent_id else {
            return Ok(());
        };

        let parent = self.get_mut(parent_id)?;
        if let Some(index) = parent.children_ids.iter().position(|&id| id == node_id) {
            parent.children_ids.remove(index);
        }
        self.get_mut(node_id)?.parent_id = None;
        Ok(())
    }

    /// Traverse tree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Find elements in the subtree rooted at `start_id` by tag name
    pub fn find_by_tag(&self, start_id: NodeId, tag: &str) -> Result<Vec<NodeId>> {
        let mut found = Vec::new();
        self.traverse_df(start_id, |node| {
            if node.is_element() && node.node_name.eq_ignore_ascii_case(tag) {
                found.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(found)
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_element(node: &DomNode) -> Result<()> {
    if node.is_element() {
        Ok(())
    } else {
        Err(DomError::InvalidNodeType {
            expected: NodeType::Element.to_string(),
            actual: node.node_type.to_string(),
        })
    }
}
