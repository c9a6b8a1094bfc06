use super::TreeInt;
use super::arena::{NodeId, ParsedTree};
use super::tree::{Tree, TreeError};
use slotmap::SecondaryMap;
use std::sync::Arc;

/// Lays a parsed tree out as a ranked tree array.
///
/// Leaves take slots `[0, L)` sorted by label (see [`Tree`]), internal nodes take slots
/// `[L, 2L - 1)` sorted by their entry in `times`. Parent/child links are
/// set in parse order, so a node's first child in the input fills its first
/// child slot.
pub fn build_tree(
    parsed: &ParsedTree,
    times: &SecondaryMap<NodeId, TreeInt>,
) -> Result<Tree, TreeError> {
    let mut leaves: Vec<(&str, NodeId)> = parsed
        .leaf_ids()
        .iter()
        .filter_map(|&id| parsed.label(id).map(|label| (label, id)))
        .collect();
    sort_by_leaf_label(&mut leaves);
    if let Some(pair) = leaves.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(TreeError::DuplicateLeafLabel(pair[0].0.to_string()));
    }

    let mut internals: Vec<(TreeInt, NodeId)> =
        Vec::with_capacity(parsed.internal_node_count());
    for &id in parsed.internal_ids() {
        let time = times.get(id).copied().ok_or_else(|| {
            TreeError::InvalidTree(format!("internal node {id} has no time"))
        })?;
        internals.push((time, id));
    }
    internals.sort_unstable_by_key(|&(time, _)| time);

    let num_leaves = leaves.len();
    let mut slots: SecondaryMap<NodeId, usize> =
        SecondaryMap::with_capacity(parsed.node_count());
    for (slot, &(_, id)) in leaves.iter().enumerate() {
        let _ = slots.insert(id, slot);
    }
    for (offset, &(_, id)) in internals.iter().enumerate() {
        let _ = slots.insert(id, num_leaves + offset);
    }

    let leaf_labels: Vec<Arc<str>> =
        leaves.iter().map(|&(label, _)| Arc::from(label)).collect();
    let mut tree = Tree::with_leaves(leaf_labels);

    for &(time, id) in &internals {
        tree.set_time(slots[id], time)?;
    }

    for &parent_id in parsed.internal_ids() {
        let parent_slot = slots[parent_id];
        for &child_id in parsed.child_ids(parent_id) {
            let child_slot = slots.get(child_id).copied().ok_or_else(|| {
                TreeError::InvalidTree(format!("node {child_id} has no slot"))
            })?;
            tree.link(parent_slot, child_slot)?;
        }
    }

    tree.finish()
}

/// Numeric order when every label is a plain unsigned integer, byte order
/// otherwise. Two labels are equal under either order only if they are the
/// same string, so duplicates end up adjacent.
fn sort_by_leaf_label<T>(leaves: &mut [(&str, T)]) {
    if leaves.iter().all(|(label, _)| integer_label(label).is_some()) {
        leaves.sort_unstable_by_key(|(label, _)| integer_label(label));
    } else {
        leaves.sort_unstable_by(|a, b| a.0.cmp(b.0));
    }
}

/// `Some(n)` only for the canonical spelling of `n` (no sign, no leading
/// zeros).
fn integer_label(label: &str) -> Option<u64> {
    let value = label.parse::<u64>().ok()?;
    (value.to_string() == label).then_some(value)
}
