//! Arena-backed forest of Fund-rooted clearing trees.

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{NodeData, NodeId};
use crate::domain::error::DomainError;

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    /// Payload for this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for fund roots
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in source order
    pub children: Vec<Index>,
}

/// Arena-based forest holding every hierarchy of a session.
///
/// Each node is owned by exactly one parent (or is a root); children are
/// stored as arena indices so no node is ever reachable from two parents.
/// Nodes are only added while the forest is built; afterwards the selection
/// flag is the only thing that changes, and only the cascade module writes it.
#[derive(Debug, Default)]
pub struct Forest {
    arena: Arena<TreeNode>,
    roots: Vec<Index>,
    ids: HashMap<NodeId, Index>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under `parent`, or as a new root when `parent` is None.
    #[instrument(level = "trace", skip(self, data), fields(id = %data.id))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Result<Index, DomainError> {
        if self.ids.contains_key(&data.id) {
            return Err(DomainError::DuplicateId(data.id));
        }
        if let Some(parent_idx) = parent {
            if !self.arena.contains(parent_idx) {
                return Err(DomainError::InvalidParent(data.id));
            }
        }

        let id = data.id.clone();
        let node_idx = self.arena.insert(TreeNode {
            data,
            parent,
            children: Vec::new(),
        });
        self.ids.insert(id, node_idx);

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => parent.children.push(node_idx),
            None => self.roots.push(node_idx),
        }

        Ok(node_idx)
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub(crate) fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    /// Resolve a node id to its arena index.
    pub fn lookup(&self, id: &NodeId) -> Option<Index> {
        self.ids.get(id).copied()
    }

    /// Resolve a node id, failing with `UnknownNode`.
    pub fn require(&self, id: &NodeId) -> Result<Index, DomainError> {
        self.lookup(id)
            .ok_or_else(|| DomainError::UnknownNode(id.clone()))
    }

    pub fn node_by_id(&self, id: &NodeId) -> Option<&TreeNode> {
        self.lookup(id).and_then(|idx| self.get_node(idx))
    }

    /// Fund roots in source order.
    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn children(&self, idx: Index) -> &[Index] {
        self.get_node(idx)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal over every tree, roots in source order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, &self.roots)
    }

    /// Pre-order traversal of the subtree rooted at `idx`, `idx` included.
    pub fn iter_from(&self, idx: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, &[idx])
    }

    /// Post-order traversal over every tree.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, &self.roots)
    }

    /// Post-order traversal over the subtrees rooted at `roots`, in order.
    pub fn postorder_over(&self, roots: &[Index]) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, roots)
    }

    /// Leaf descendants of `idx` (or `idx` itself when it is a leaf).
    pub fn leaves(&self, idx: Index) -> impl Iterator<Item = (Index, &TreeNode)> + '_ {
        self.iter_from(idx).filter(|(_, node)| node.data.is_leaf())
    }

    /// Ancestors of `idx`, nearest first.
    pub fn ancestors(&self, idx: Index) -> Ancestors<'_> {
        Ancestors {
            forest: self,
            next: self.get_node(idx).and_then(|n| n.parent),
        }
    }

    /// Number of levels in the deepest tree, 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }
}

pub struct TreeIterator<'a> {
    forest: &'a Forest,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(forest: &'a Forest, roots: &[Index]) -> Self {
        // Reverse so the first root is popped first
        let stack = roots.iter().rev().copied().collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    forest: &'a Forest,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(forest: &'a Forest, roots: &[Index]) -> Self {
        let stack = roots.iter().rev().map(|&r| (r, false)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

pub struct Ancestors<'a> {
    forest: &'a Forest,
    next: Option<Index>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = self.forest.get_node(idx)?;
        self.next = node.parent;
        Some((idx, node))
    }
}
