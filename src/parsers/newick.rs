pub(crate) mod validation;

use super::super::TreeFloat;
use super::super::phylo::arena::{NodeId, ParsedNode, ParsedTree};
use super::super::phylo::builder::build_tree;
use super::super::phylo::discretize::{Discretization, discretize};
use super::super::phylo::heights::reconcile_heights;
use super::super::phylo::tree::{Tree, TreeList};
use super::{BatchError, TreeParseError};
use slotmap::SecondaryMap;
use std::path::Path;
use validation::check_newick_structure;

/// Checks if a byte ends an unquoted NEWICK label. Whitespace does not; it
/// is trimmed from both ends of the label instead.
fn is_label_delimiter(byte: u8) -> bool {
    matches!(byte, b':' | b',' | b'(' | b')' | b';' | b'[' | b'\'')
}

/// Checks if a byte can be part of a decimal or exponential number.
fn is_number_byte(byte: u8) -> bool {
    byte.is_ascii_digit() || matches!(byte, b'.' | b'+' | b'-' | b'e' | b'E')
}

/// State of the single left-to-right NEWICK scan.
///
/// `open_ids` is the stack of internal nodes whose `)` has not been read yet;
/// its top is the parent of whatever node is read next. `last_completed` is
/// the node a following `:` length belongs to.
struct ParserState<'a> {
    s: &'a str,
    position: usize,
    tree: ParsedTree,
    open_ids: Vec<NodeId>,
    last_completed: Option<NodeId>,
}

impl<'a> ParserState<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            s,
            position: 0,
            tree: ParsedTree::new(),
            open_ids: Vec::new(),
            last_completed: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.position).copied()
    }

    fn error(&self, message: impl Into<String>) -> TreeParseError {
        TreeParseError::newick(self.position, message)
    }

    fn run(mut self) -> Result<ParsedTree, TreeParseError> {
        let mut terminated = false;
        while let Some(byte) = self.peek() {
            match byte {
                b'(' => self.process_open_paren()?,
                b')' => self.process_close_paren()?,
                b',' => self.process_comma()?,
                b':' => self.process_branch_length()?,
                b'[' => self.skip_annotation()?,
                b';' => {
                    terminated = true;
                    break;
                }
                b if b.is_ascii_whitespace() => self.position += 1,
                _ => self.process_leaf()?,
            }
        }

        if !self.open_ids.is_empty() {
            return Err(self.error("unbalanced '('"));
        }
        if !terminated {
            return Err(self.error("missing terminating ';'"));
        }
        if self.tree.root_id().is_none() {
            return Err(self.error("no parenthesised tree before ';'"));
        }
        Ok(self.tree)
    }

    fn expect_new_node(&self) -> Result<(), TreeParseError> {
        if self.last_completed.is_some() {
            Err(self.error("expected ',' or ')' between sibling nodes"))
        } else {
            Ok(())
        }
    }

    fn process_open_paren(&mut self) -> Result<(), TreeParseError> {
        self.expect_new_node()?;
        let parent_id = self.open_ids.last().copied();
        if parent_id.is_none() && self.tree.root_id().is_some() {
            return Err(self.error("more than one top-level subtree"));
        }
        let node_id = self.tree.add_node(ParsedNode::internal(), parent_id)?;
        self.open_ids.push(node_id);
        self.position += 1;
        Ok(())
    }

    fn process_close_paren(&mut self) -> Result<(), TreeParseError> {
        let Some(node_id) = self.open_ids.pop() else {
            return Err(self.error("unbalanced ')'"));
        };
        if self.last_completed.is_none() {
            return Err(self.error("missing node before ')'"));
        }
        let child_count = self.tree.child_ids(node_id).len();
        if child_count != 2 {
            return Err(self.error(format!(
                "internal node has {child_count} children; only binary trees \
                 are supported"
            )));
        }
        self.tree.close(node_id);
        self.last_completed = Some(node_id);
        self.position += 1;

        // An internal node label may follow; it carries no meaning here.
        self.skip_whitespace();
        if self.peek().is_some_and(|b| b == b'\'' || !is_label_delimiter(b)) {
            let _ = self.read_label()?;
        }
        Ok(())
    }

    fn process_comma(&mut self) -> Result<(), TreeParseError> {
        if self.open_ids.is_empty() {
            return Err(self.error("',' outside of parentheses"));
        }
        if self.last_completed.is_none() {
            return Err(self.error("missing node before ','"));
        }
        self.last_completed = None;
        self.position += 1;
        Ok(())
    }

    fn process_leaf(&mut self) -> Result<(), TreeParseError> {
        self.expect_new_node()?;
        let Some(parent_id) = self.open_ids.last().copied() else {
            return Err(self.error("leaf label outside of parentheses"));
        };
        let label = self.read_label()?;
        let node_id =
            self.tree.add_node(ParsedNode::leaf(label.as_str()), Some(parent_id))?;
        self.last_completed = Some(node_id);
        Ok(())
    }

    fn process_branch_length(&mut self) -> Result<(), TreeParseError> {
        let Some(node_id) = self.last_completed else {
            return Err(self.error("':' without a preceding node"));
        };
        if self
            .tree
            .node(node_id)
            .is_some_and(|node| node.branch_length().is_some())
        {
            return Err(self.error("more than one branch length for a node"));
        }
        self.position += 1;

        // Annotations may sit between ':' and the number.
        loop {
            self.skip_whitespace();
            if self.peek() == Some(b'[') {
                self.skip_annotation()?;
            } else {
                break;
            }
        }

        let start = self.position;
        while self.peek().is_some_and(is_number_byte) {
            self.position += 1;
        }
        let text = &self.s[start..self.position];
        let branch_length = text.parse::<TreeFloat>().map_err(|_| {
            TreeParseError::newick(
                start,
                format!("expected a branch length, found '{text}'"),
            )
        })?;
        self.tree.set_branch_length(node_id, Some(branch_length));
        Ok(())
    }

    /// Skips a `[...]` annotation, which may itself contain brackets.
    fn skip_annotation(&mut self) -> Result<(), TreeParseError> {
        let start = self.position;
        let mut depth: usize = 0;
        while let Some(byte) = self.peek() {
            self.position += 1;
            match byte {
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(TreeParseError::newick(start, "unterminated '['"))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.position += 1;
        }
    }

    /// Reads a bare label up to the next delimiter, or a quoted label where
    /// `''` stands for one quote. Bare labels may contain inner spaces.
    fn read_label(&mut self) -> Result<String, TreeParseError> {
        if self.peek() != Some(b'\'') {
            let start = self.position;
            while self.peek().is_some_and(|b| !is_label_delimiter(b)) {
                self.position += 1;
            }
            return Ok(self.s[start..self.position].trim().to_string());
        }

        let start = self.position;
        self.position += 1;
        let mut label = String::new();
        loop {
            let rest = &self.s[self.position..];
            let Some(quote) = rest.find('\'') else {
                return Err(TreeParseError::newick(start, "unterminated quote"));
            };
            label.push_str(&rest[..quote]);
            self.position += quote + 1;
            if self.peek() == Some(b'\'') {
                label.push('\'');
                self.position += 1;
            } else {
                return Ok(label);
            }
        }
    }
}

/// Parses one NEWICK tree into a node arena, without touching its lengths.
pub fn parse_newick_arena(s: &str) -> Result<ParsedTree, TreeParseError> {
    check_newick_structure(s)?;
    ParserState::new(s).run()
}

/// Parses one rooted binary NEWICK tree into a ranked tree array.
pub fn parse_newick(
    s: &str,
    discretization: Discretization,
) -> Result<Tree, TreeParseError> {
    let parsed = parse_newick_arena(s)?;
    rank_parsed_tree(&parsed, discretization)
}

/// Reconciles heights, discretizes them, and lays the tree out as an array.
///
/// Equal heights are ordered by the position of each node's `)` in the
/// input, so a node never ends up below one of its own descendants.
pub fn rank_parsed_tree(
    parsed: &ParsedTree,
    discretization: Discretization,
) -> Result<Tree, TreeParseError> {
    let heights = reconcile_heights(parsed)?;

    let closing_order = parsed.closing_order();
    let internal_heights: Vec<TreeFloat> =
        closing_order.iter().map(|&id| heights[id]).collect();
    let internal_times = discretize(&internal_heights, discretization)?;

    let mut times = SecondaryMap::with_capacity(closing_order.len());
    for (&id, &time) in closing_order.iter().zip(&internal_times) {
        let _ = times.insert(id, time);
    }

    let tree = build_tree(parsed, &times)?;
    tracing::debug!(
        leaves = tree.num_leaves(),
        root_time = tree.root_time(),
        "ranked tree built"
    );
    Ok(tree)
}

/// Parses every line ending in `;` as one NEWICK tree. The first failure
/// aborts the whole batch.
pub fn parse_newick_batch(
    s: &str,
    discretization: Discretization,
) -> Result<TreeList, BatchError> {
    let count = s.lines().filter(|line| is_newick_line(line)).count();
    let mut trees = TreeList::with_capacity(count);

    for (line_index, line) in s.lines().enumerate() {
        if !is_newick_line(line) {
            continue;
        }
        let tree = parse_newick(line.trim(), discretization).map_err(
            |source| BatchError::TreeStatement { line: line_index + 1, source },
        )?;
        trees.push(tree);
    }

    tracing::debug!(
        trees = trees.len(),
        max_root_time = trees.max_root_time(),
        "NEWICK batch read"
    );
    Ok(trees)
}

pub fn read_newick_file(
    path: impl AsRef<Path>,
    discretization: Discretization,
) -> Result<TreeList, BatchError> {
    let content = std::fs::read_to_string(path)?;
    parse_newick_batch(&content, discretization)
}

fn is_newick_line(line: &str) -> bool {
    let line = line.trim();
    !line.starts_with('#') && line.ends_with(';')
}

/// Converts a ranked tree to NEWICK; each branch length is the difference
/// between the parent's and the child's time.
pub fn write_newick(tree: &Tree) -> String {
    let Some(root) = tree.root() else {
        return String::new();
    };
    let mut newick = String::new();
    newick_string_recursive(tree, root.index(), &mut newick);
    newick.push(';');
    newick
}

fn newick_string_recursive(tree: &Tree, index: usize, newick: &mut String) {
    let node = &tree[index];
    if node.is_leaf() {
        newick.push_str(&quote_label(tree.leaf_label(index).unwrap_or_default()));
    } else {
        newick.push('(');
        for (i, child) in node.child_indices().enumerate() {
            if i > 0 {
                newick.push(',');
            }
            newick_string_recursive(tree, child, newick);
        }
        newick.push(')');
    }

    if let Some(parent) = node.parent_index() {
        newick.push_str(&format!(":{}", tree[parent].time() - node.time()));
    }
}

fn quote_label(label: &str) -> String {
    if !label.is_empty()
        && !label
            .bytes()
            .any(|b| is_label_delimiter(b) || b.is_ascii_whitespace())
    {
        label.to_string()
    } else {
        format!("'{}'", label.replace('\'', "''"))
    }
}
