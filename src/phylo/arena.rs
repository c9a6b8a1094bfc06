use super::TreeFloat;
use super::tree::TreeError;
use slotmap::{SlotMap, new_key_type};
use std::{fmt::Display, sync::Arc};

new_key_type! { pub struct NodeId; }

/// What a parsed node is: a labelled leaf or an internal node with its
/// children in the order they appeared in the input.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Leaf { label: Arc<str> },
    Internal { child_ids: Vec<NodeId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNode {
    node_id: Option<NodeId>,
    parent_id: Option<NodeId>,
    branch_length: Option<TreeFloat>,
    kind: NodeKind,
}

impl ParsedNode {
    pub fn leaf<'a>(label: impl Into<&'a str>) -> Self {
        Self {
            node_id: None,
            parent_id: None,
            branch_length: None,
            kind: NodeKind::Leaf { label: label.into().into() },
        }
    }

    pub fn internal() -> Self {
        Self {
            node_id: None,
            parent_id: None,
            branch_length: None,
            kind: NodeKind::Internal { child_ids: Vec::new() },
        }
    }

    pub fn node_id(&self) -> Option<&NodeId> { self.node_id.as_ref() }
    pub fn parent_id(&self) -> Option<&NodeId> { self.parent_id.as_ref() }
    pub fn branch_length(&self) -> Option<TreeFloat> { self.branch_length }
    pub fn kind(&self) -> &NodeKind { &self.kind }
    pub fn is_leaf(&self) -> bool { matches!(self.kind, NodeKind::Leaf { .. }) }

    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf { label } => Some(label),
            NodeKind::Internal { .. } => None,
        }
    }

    pub fn child_ids(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf { .. } => &[],
            NodeKind::Internal { child_ids } => child_ids,
        }
    }

    fn add_child_id(&mut self, node_id: NodeId) -> bool {
        match &mut self.kind {
            NodeKind::Leaf { .. } => false,
            NodeKind::Internal { child_ids } => {
                child_ids.push(node_id);
                true
            }
        }
    }
}

/// Append-only node arena filled by the Newick scanner.
///
/// Internal nodes are remembered twice: in creation order (when their `(`
/// was read) and in closing order (when their `)` was read). Closing order
/// is a post-order, so every node closes after all of its descendants.
#[derive(Debug, Default, Clone)]
pub struct ParsedTree {
    nodes: SlotMap<NodeId, ParsedNode>,
    root_id: Option<NodeId>,
    leaf_ids: Vec<NodeId>,
    internal_ids: Vec<NodeId>,
    closing_order: Vec<NodeId>,
}

impl ParsedTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        mut node: ParsedNode,
        parent_id: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        if let Some(parent_id) = parent_id {
            match self.nodes.get(parent_id) {
                Some(parent) if !parent.is_leaf() => {}
                Some(_) => {
                    return Err(TreeError::InvalidTree(format!(
                        "leaf {parent_id} cannot take a child"
                    )));
                }
                None => {
                    return Err(TreeError::InvalidTree(format!(
                        "parent {parent_id} is not in the tree"
                    )));
                }
            }
        } else if self.root_id.is_some() || node.is_leaf() {
            return Err(TreeError::InvalidTree(
                "only a single internal root node may lack a parent"
                    .to_string(),
            ));
        }

        node.parent_id = parent_id;
        let is_leaf = node.is_leaf();
        let node_id = self.nodes.insert_with_key(|node_id| {
            node.node_id = Some(node_id);
            node
        });

        if let Some(parent_id) = parent_id
            && let Some(parent) = self.nodes.get_mut(parent_id)
        {
            let _ = parent.add_child_id(node_id);
        }

        if is_leaf {
            self.leaf_ids.push(node_id);
        } else {
            if parent_id.is_none() {
                self.root_id = Some(node_id);
            }
            self.internal_ids.push(node_id);
        }

        Ok(node_id)
    }

    /// Marks an internal node as complete; all of its children are known.
    pub fn close(&mut self, node_id: NodeId) {
        self.closing_order.push(node_id);
    }

    pub fn set_branch_length(
        &mut self,
        node_id: NodeId,
        branch_length: Option<TreeFloat>,
    ) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.branch_length = branch_length;
        }
    }

    pub fn node(&self, node_id: NodeId) -> Option<&ParsedNode> {
        self.nodes.get(node_id)
    }

    pub fn root_id(&self) -> Option<NodeId> { self.root_id }
    pub fn leaf_ids(&self) -> &[NodeId] { &self.leaf_ids }
    pub fn internal_ids(&self) -> &[NodeId] { &self.internal_ids }
    pub fn closing_order(&self) -> &[NodeId] { &self.closing_order }
    pub fn leaf_count(&self) -> usize { self.leaf_ids.len() }
    pub fn internal_node_count(&self) -> usize { self.internal_ids.len() }
    pub fn node_count(&self) -> usize { self.nodes.len() }

    pub fn child_ids(&self, node_id: NodeId) -> &[NodeId] {
        self.nodes.get(node_id).map(|n| n.child_ids()).unwrap_or_default()
    }

    pub fn is_leaf(&self, node_id: NodeId) -> bool {
        self.nodes.get(node_id).is_some_and(|n| n.is_leaf())
    }

    pub fn label(&self, node_id: NodeId) -> Option<&str> {
        self.nodes.get(node_id).and_then(|n| n.label())
    }

    /// Length of the edge above `node_id`; a missing length counts as 0.
    pub fn branch_length(&self, node_id: NodeId) -> TreeFloat {
        self.nodes
            .get(node_id)
            .and_then(|n| n.branch_length())
            .unwrap_or(0e0)
    }

    /// Leaf labels of the subtree below `node_id`, sorted.
    pub fn cluster(&self, node_id: NodeId) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        let mut stack: Vec<NodeId> = vec![node_id];
        while let Some(id) = stack.pop() {
            if let Some(label) = self.label(id) {
                labels.push(label);
            }
            stack.extend(self.child_ids(id));
        }
        labels.sort_unstable();
        labels
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let disp = format!("{self:?}");
        write!(f, "{}", &disp[7..disp.len() - 1])
    }
}
