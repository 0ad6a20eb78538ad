//! Arena-backed ordered tree.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Index of a node inside its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Stable identifier of a node, used to address rows from outside the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One node of a [`Tree`].
///
/// The payload is `None` only for the root sentinel.
#[derive(Debug, Clone)]
pub struct TreeNode<T> {
    item_id: ItemId,
    data: Option<T>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl<T> TreeNode<T> {
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Ordered tree that exclusively owns its nodes.
///
/// Nodes are only attached through [`Tree::add_child`], which keeps the
/// parent back-reference and the parent's child list consistent.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    nodes: Vec<TreeNode<T>>,
    by_item: HashMap<ItemId, NodeId>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        let root = TreeNode {
            item_id: ItemId::new(),
            data: None,
            parent: None,
            children: Vec::new(),
        };
        let mut by_item = HashMap::new();
        by_item.insert(root.item_id, NodeId(0));
        Self {
            nodes: vec![root],
            by_item,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a new child under `parent`.
    ///
    /// An unknown parent falls back to the root.
    pub fn add_child(&mut self, parent: NodeId, data: T) -> NodeId {
        let parent = if parent.0 < self.nodes.len() {
            parent
        } else {
            self.root()
        };
        let id = NodeId(self.nodes.len());
        let node = TreeNode {
            item_id: ItemId::new(),
            data: Some(data),
            parent: Some(parent),
            children: Vec::new(),
        };
        self.by_item.insert(node.item_id, id);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, node: NodeId) -> Option<&TreeNode<T>> {
        self.nodes.get(node.0)
    }

    pub fn get(&self, node: NodeId) -> Option<&T> {
        self.node(node).and_then(TreeNode::data)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(node.0).and_then(|n| n.data.as_mut())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(TreeNode::parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(TreeNode::children).unwrap_or(&[])
    }

    pub fn child(&self, node: NodeId, row: usize) -> Option<NodeId> {
        self.children(node).get(row).copied()
    }

    pub fn row_count(&self, node: NodeId) -> usize {
        self.children(node).len()
    }

    /// Position of `node` among its siblings (0 for the root).
    pub fn row(&self, node: NodeId) -> usize {
        self.parent(node)
            .and_then(|parent| self.children(parent).iter().position(|c| *c == node))
            .unwrap_or(0)
    }

    /// Whether `node` is a direct child of the root.
    pub fn is_top_level(&self, node: NodeId) -> bool {
        self.parent(node) == Some(self.root())
    }

    pub fn item_id(&self, node: NodeId) -> Option<ItemId> {
        self.node(node).map(TreeNode::item_id)
    }

    pub fn find(&self, item_id: ItemId) -> Option<NodeId> {
        self.by_item.get(&item_id).copied()
    }

    /// All descendants of `node` in depth-first pre-order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut output = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            output.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        output
    }
}
