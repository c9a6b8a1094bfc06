use super::TreeInt;
use super::node::{NO_NODE, Node};
use std::ops::Index;
use std::sync::Arc;
use thiserror::Error;

/// A ranked tree laid out in one array of `2L - 1` nodes.
///
/// Leaves occupy `[0, L)` in ascending label order, internal nodes occupy
/// `[L, 2L - 1)` in ascending time order, and the last slot is the root.
/// Labels compare numerically when every label is a plain unsigned integer
/// (`"9"` before `"10"`) and byte-wise otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    leaf_labels: Vec<Arc<str>>,
    root_time: TreeInt,
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Tree validation failed: {0}.")]
    InvalidTree(String),
    #[error("Leaf label '{0}' occurs more than once.")]
    DuplicateLeafLabel(String),
    #[error("Node {0} already has two children.")]
    ChildSlotsFull(usize),
    #[error("Node index {0} is out of range.")]
    IndexOutOfRange(usize),
}

impl Tree {
    // =========================================================================
    // Construction & Validation
    // =========================================================================

    /// Allocates the full array for the given (sorted) leaf labels with every
    /// slot unlinked.
    pub(crate) fn with_leaves(leaf_labels: Vec<Arc<str>>) -> Self {
        let node_count = (2 * leaf_labels.len()).saturating_sub(1);
        let nodes = (0..node_count).map(Node::new).collect();
        Self { nodes, leaf_labels, root_time: 0 }
    }

    pub(crate) fn link(
        &mut self,
        parent: usize,
        child: usize,
    ) -> Result<(), TreeError> {
        if child >= self.nodes.len() {
            return Err(TreeError::IndexOutOfRange(child));
        }
        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or(TreeError::IndexOutOfRange(parent))?;
        if !parent_node.add_child(child) {
            return Err(TreeError::ChildSlotsFull(parent));
        }
        self.nodes[child].set_parent(parent);
        Ok(())
    }

    pub(crate) fn set_time(
        &mut self,
        index: usize,
        time: TreeInt,
    ) -> Result<(), TreeError> {
        self.nodes
            .get_mut(index)
            .ok_or(TreeError::IndexOutOfRange(index))?
            .set_time(time);
        Ok(())
    }

    /// Records the root time and checks every layout invariant.
    pub(crate) fn finish(mut self) -> Result<Self, TreeError> {
        self.root_time = self.nodes.last().map(|n| n.time()).unwrap_or(0);
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), TreeError> {
        let num_leaves = self.num_leaves();
        if num_leaves < 2 {
            return Err(TreeError::InvalidTree(format!(
                "a ranked tree needs at least 2 leaves, found {num_leaves}"
            )));
        }
        if self.nodes.len() != 2 * num_leaves - 1 {
            return Err(TreeError::InvalidTree(format!(
                "expected {} nodes for {num_leaves} leaves, found {}",
                2 * num_leaves - 1,
                self.nodes.len()
            )));
        }

        let root_index = self.nodes.len() - 1;
        let mut count_of_root: usize = 0;
        let mut previous_time: TreeInt = 0;

        for (index, node) in self.nodes.iter().enumerate() {
            if node.index() != index {
                return Err(TreeError::InvalidTree(format!(
                    "node at slot {index} records index {}",
                    node.index()
                )));
            }

            if node.is_root() {
                count_of_root += 1;
                if index != root_index {
                    return Err(TreeError::InvalidTree(format!(
                        "node {index} has no parent but is not the last slot"
                    )));
                }
            } else {
                match node.parent_index() {
                    Some(parent)
                        if parent > index
                            && parent < self.nodes.len()
                            && self.nodes[parent]
                                .children()
                                .contains(&(index as TreeInt)) => {}
                    _ => {
                        return Err(TreeError::InvalidTree(format!(
                            "node {index} has an inconsistent parent {}",
                            node.parent()
                        )));
                    }
                }
            }

            if index < num_leaves {
                if node.time() != 0 || !node.is_leaf() {
                    return Err(TreeError::InvalidTree(format!(
                        "leaf {index} must have time 0 and no children"
                    )));
                }
                continue;
            }

            if node.time() <= previous_time {
                return Err(TreeError::InvalidTree(format!(
                    "internal node {index} has time {} after time {previous_time}",
                    node.time()
                )));
            }
            previous_time = node.time();

            let children = node.children();
            if children.contains(&NO_NODE) || children[0] == children[1] {
                return Err(TreeError::InvalidTree(format!(
                    "internal node {index} needs two distinct children"
                )));
            }
            for child in node.child_indices() {
                if child >= index || self.nodes[child].parent_index() != Some(index)
                {
                    return Err(TreeError::InvalidTree(format!(
                        "internal node {index} has an inconsistent child {child}"
                    )));
                }
            }
        }

        if count_of_root != 1 {
            return Err(TreeError::InvalidTree(format!(
                "count_of_root({count_of_root}) should equal 1"
            )));
        }
        if self.root_time != self.nodes[root_index].time() {
            return Err(TreeError::InvalidTree(format!(
                "root_time({}) differs from the root's time",
                self.root_time
            )));
        }

        Ok(())
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn nodes(&self) -> &[Node] { &self.nodes }
    pub fn node(&self, index: usize) -> Option<&Node> { self.nodes.get(index) }
    pub fn num_leaves(&self) -> usize { self.leaf_labels.len() }
    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn root_time(&self) -> TreeInt { self.root_time }
    pub fn leaf_labels(&self) -> &[Arc<str>] { &self.leaf_labels }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn leaf_label(&self, index: usize) -> Option<&str> {
        self.leaf_labels.get(index).map(|label| label.as_ref())
    }

    pub fn leaf_index(&self, label: &str) -> Option<usize> {
        self.leaf_labels.iter().position(|l| &**l == label)
    }

    /// Internal nodes as `(index, node)` pairs, in ascending time order.
    pub fn internal_nodes(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.nodes.iter().enumerate().skip(self.num_leaves())
    }

    /// Leaf indices below every internal node, sorted, in internal-node order.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let num_leaves = self.num_leaves();
        let mut clusters: Vec<Vec<usize>> =
            Vec::with_capacity(self.nodes.len().saturating_sub(num_leaves));
        for (index, node) in self.internal_nodes() {
            let mut cluster: Vec<usize> = Vec::new();
            for child in node.child_indices() {
                if child < num_leaves {
                    cluster.push(child);
                } else if child < index {
                    cluster.extend_from_slice(&clusters[child - num_leaves]);
                }
            }
            cluster.sort_unstable();
            clusters.push(cluster);
        }
        clusters
    }
}

impl Index<usize> for Tree {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        &self.nodes[index]
    }
}

/// Trees read from one source, in source order, plus the largest root time
/// among them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TreeList {
    trees: Vec<Tree>,
    max_root_time: TreeInt,
}

impl TreeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { trees: Vec::with_capacity(capacity), max_root_time: 0 }
    }

    pub fn push(&mut self, tree: Tree) {
        self.max_root_time = self.max_root_time.max(tree.root_time());
        self.trees.push(tree);
    }

    pub fn trees(&self) -> &[Tree] { &self.trees }
    pub fn len(&self) -> usize { self.trees.len() }
    pub fn is_empty(&self) -> bool { self.trees.is_empty() }
    pub fn max_root_time(&self) -> TreeInt { self.max_root_time }

    pub fn iter(&self) -> std::slice::Iter<'_, Tree> {
        self.trees.iter()
    }

    pub fn into_trees(self) -> Vec<Tree> {
        self.trees
    }
}

impl Index<usize> for TreeList {
    type Output = Tree;

    fn index(&self, index: usize) -> &Tree {
        &self.trees[index]
    }
}

impl<'a> IntoIterator for &'a TreeList {
    type Item = &'a Tree;
    type IntoIter = std::slice::Iter<'a, Tree>;

    fn into_iter(self) -> Self::IntoIter {
        self.trees.iter()
    }
}

impl FromIterator<Tree> for TreeList {
    fn from_iter<I: IntoIterator<Item = Tree>>(iter: I) -> Self {
        let mut tree_list = TreeList::new();
        for tree in iter {
            tree_list.push(tree);
        }
        tree_list
    }
}
