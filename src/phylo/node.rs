use super::TreeInt;

/// Sentinel for an unset parent or child slot.
pub const NO_NODE: TreeInt = -1;

/// One slot of a ranked tree array.
///
/// Parent and child references are array indices, with [`NO_NODE`] marking
/// the root's parent and the children of leaves. Leaves have time 0; every
/// internal node has a distinct positive time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    index: usize,
    parent: TreeInt,
    children: [TreeInt; 2],
    time: TreeInt,
}

impl Node {
    pub fn new(index: usize) -> Self {
        Self { index, parent: NO_NODE, children: [NO_NODE; 2], time: 0 }
    }

    pub fn index(&self) -> usize { self.index }
    pub fn parent(&self) -> TreeInt { self.parent }
    pub fn children(&self) -> [TreeInt; 2] { self.children }
    pub fn time(&self) -> TreeInt { self.time }
    pub fn is_root(&self) -> bool { self.parent == NO_NODE }

    pub fn is_leaf(&self) -> bool {
        self.children == [NO_NODE; 2]
    }

    pub fn parent_index(&self) -> Option<usize> {
        usize::try_from(self.parent).ok()
    }

    pub fn child_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.children.iter().filter_map(|&c| usize::try_from(c).ok())
    }

    pub(crate) fn set_parent(&mut self, parent: usize) {
        self.parent = parent as TreeInt;
    }

    pub(crate) fn set_time(&mut self, time: TreeInt) {
        self.time = time;
    }

    /// Fills the first empty child slot. Returns false when both are taken.
    pub(crate) fn add_child(&mut self, child: usize) -> bool {
        match self.children.iter_mut().find(|c| **c == NO_NODE) {
            Some(slot) => {
                *slot = child as TreeInt;
                true
            }
            None => false,
        }
    }
}
