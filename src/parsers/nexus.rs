use super::super::phylo::discretize::Discretization;
use super::super::phylo::tree::TreeList;
use super::BatchError;
use super::newick::parse_newick;
use std::path::Path;

/// Reads every `tree <name> = <newick>;` statement in `content`.
///
/// Statements are counted first so the list is allocated once, then parsed
/// in source order. Lines that are not tree statements are ignored. The
/// first statement that fails to parse aborts the whole read.
pub fn parse_nexus(
    content: &str,
    discretization: Discretization,
) -> Result<TreeList, BatchError> {
    let count = content.lines().filter(|line| is_tree_statement(line)).count();
    let mut trees = TreeList::with_capacity(count);

    for (line_index, line) in content.lines().enumerate() {
        if !is_tree_statement(line) {
            continue;
        }
        let line_number = line_index + 1;
        let newick = extract_newick(line)
            .ok_or(BatchError::MissingNewick { line: line_number })?;
        let tree = parse_newick(&newick, discretization).map_err(|source| {
            BatchError::TreeStatement { line: line_number, source }
        })?;
        trees.push(tree);
    }

    tracing::debug!(
        trees = trees.len(),
        max_root_time = trees.max_root_time(),
        "NEXUS trees read"
    );
    Ok(trees)
}

pub fn read_nexus_file(
    path: impl AsRef<Path>,
    discretization: Discretization,
) -> Result<TreeList, BatchError> {
    let content = std::fs::read_to_string(path)?;
    parse_nexus(&content, discretization)
}

/// A tree statement starts with the keyword `tree` (any case) followed by
/// whitespace, assigns with `=`, and ends with `;`.
pub(crate) fn is_tree_statement(line: &str) -> bool {
    let line = line.trim();
    let Some(keyword) = line.get(..4) else {
        return false;
    };
    keyword.eq_ignore_ascii_case("tree")
        && line[4..].starts_with(char::is_whitespace)
        && line.contains('=')
        && line.ends_with(';')
}

/// Takes the NEWICK part of a tree statement: annotations removed, cut after
/// the last `)` and terminated with `;`. Any root branch length is dropped.
fn extract_newick(line: &str) -> Option<String> {
    let line = remove_annotations(line);
    let (_, definition) = line.split_once('=')?;
    let start = definition.find('(')?;
    let end = definition.rfind(')')?;
    if end < start {
        return None;
    }
    Some(format!("{};", definition[start..=end].trim()))
}

/// Removes every `[...]` block, including nested ones.
fn remove_annotations(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut depth: usize = 0;
    for ch in line.chars() {
        match ch {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => result.push(ch),
            _ => {}
        }
    }
    result
}
