use super::TreeFloat;
use super::arena::{NodeId, ParsedTree};
use super::tree::TreeError;
use slotmap::SecondaryMap;

/// Corrections larger than this fraction of the corrected node's height are
/// logged as warnings. They are applied either way.
pub const RECONCILIATION_WARN_THRESHOLD: TreeFloat = 1e-6;

/// Computes the height of every node above its leaves, making the tree
/// exactly ultrametric on the way.
///
/// Nodes are visited in closing order, so both children of a node are
/// final before the node itself. Each child proposes `height + branch
/// length`; the larger proposal becomes the node's height and the shorter
/// side's internal nodes are all raised by the difference. Leaves stay at 0.
pub fn reconcile_heights(
    tree: &ParsedTree,
) -> Result<SecondaryMap<NodeId, TreeFloat>, TreeError> {
    let mut heights: SecondaryMap<NodeId, TreeFloat> =
        SecondaryMap::with_capacity(tree.node_count());

    for &leaf_id in tree.leaf_ids() {
        let _ = heights.insert(leaf_id, 0e0);
    }

    for &node_id in tree.closing_order() {
        let &[left, right] = tree.child_ids(node_id) else {
            return Err(TreeError::InvalidTree(format!(
                "internal node {node_id} has {} children; only binary trees \
                 are supported",
                tree.child_ids(node_id).len()
            )));
        };

        let proposal = |child: NodeId| -> Result<TreeFloat, TreeError> {
            heights.get(child).map(|h| h + tree.branch_length(child)).ok_or_else(
                || {
                    TreeError::InvalidTree(format!(
                        "child {child} of node {node_id} was never closed"
                    ))
                },
            )
        };
        let left_proposal = proposal(left)?;
        let right_proposal = proposal(right)?;

        let (height, shorter, deficit) = if left_proposal >= right_proposal {
            (left_proposal, right, left_proposal - right_proposal)
        } else {
            (right_proposal, left, right_proposal - left_proposal)
        };

        if deficit > 0e0 {
            if deficit > RECONCILIATION_WARN_THRESHOLD * height.abs().max(1e0) {
                tracing::warn!(
                    node = %node_id,
                    deficit,
                    height,
                    "large height mismatch between sibling subtrees"
                );
            } else {
                tracing::trace!(node = %node_id, deficit, "height corrected");
            }
            raise_subtree(tree, &mut heights, shorter, deficit);
        }

        let _ = heights.insert(node_id, height);
    }

    Ok(heights)
}

/// Adds `deficit` to every internal node below and including `node_id`.
fn raise_subtree(
    tree: &ParsedTree,
    heights: &mut SecondaryMap<NodeId, TreeFloat>,
    node_id: NodeId,
    deficit: TreeFloat,
) {
    let mut stack: Vec<NodeId> = vec![node_id];
    while let Some(id) = stack.pop() {
        if tree.is_leaf(id) {
            continue;
        }
        if let Some(height) = heights.get_mut(id) {
            *height += deficit;
        }
        stack.extend(tree.child_ids(id));
    }
}
