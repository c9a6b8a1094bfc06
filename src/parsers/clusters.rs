//! Reading and writing the cluster encoding of a ranked tree.
//!
//! The encoding is a run of brace-delimited groups such as
//! `{1,2,3,0}{1,2,1}{1,2,3,2}`. Each group lists leaf numbers (1-based) and
//! ends with the group's time, either as the last comma-separated entry or
//! after a `:` (`{1,2:1}`). The first group is the baseline in which every
//! leaf is still on its own; it is read but not built. Every later group is
//! the cluster of one internal node, in merge order, so `n` groups describe
//! a tree with `n` leaves.

use super::super::TreeInt;
use super::super::phylo::tree::Tree;
use super::TreeParseError;
use std::sync::Arc;

struct ClusterGroup {
    members: Vec<usize>,
    time: TreeInt,
}

/// Builds a ranked tree directly from its cluster encoding. No heights are
/// reconciled and no discretization takes place; the annotated times are
/// used as they are. Leaf `k` lands in slot `k - 1` with label `"k"`, which
/// is the numeric leaf order every builder uses for integer labels.
pub fn parse_clusters(s: &str) -> Result<Tree, TreeParseError> {
    let groups = split_groups(s)?;
    let num_leaves = groups.len();
    if num_leaves < 2 {
        return Err(TreeParseError::cluster(
            groups.len(),
            "at least one cluster besides the baseline is required",
        ));
    }

    let leaf_labels: Vec<Arc<str>> =
        (1..=num_leaves).map(|n| Arc::from(n.to_string().as_str())).collect();
    let mut tree = Tree::with_leaves(leaf_labels);

    let mut highest_ancestor: Vec<usize> = (0..num_leaves).collect();
    let mut cluster_size: Vec<usize> = vec![1; 2 * num_leaves - 1];
    let mut previous_time: TreeInt = 0;

    for (offset, group) in groups.iter().enumerate().skip(1) {
        let index = num_leaves + offset - 1;

        let mut ancestors: Vec<usize> = Vec::with_capacity(2);
        for &member in &group.members {
            if member == 0 || member > num_leaves {
                return Err(TreeParseError::cluster(
                    offset,
                    format!("leaf {member} is outside 1..={num_leaves}"),
                ));
            }
            let ancestor = highest_ancestor[member - 1];
            if !ancestors.contains(&ancestor) {
                ancestors.push(ancestor);
            }
        }

        let &[first, second] = ancestors.as_slice() else {
            return Err(TreeParseError::cluster(
                offset,
                format!(
                    "merges {} ancestor groups; exactly 2 are required",
                    ancestors.len()
                ),
            ));
        };

        let size = cluster_size[first] + cluster_size[second];
        if group.members.len() != size {
            return Err(TreeParseError::cluster(
                offset,
                format!(
                    "lists {} leaves but the merged groups hold {size}",
                    group.members.len()
                ),
            ));
        }
        if group.time <= previous_time {
            return Err(TreeParseError::cluster(
                offset,
                format!(
                    "time {} does not exceed the previous time {previous_time}",
                    group.time
                ),
            ));
        }

        tree.link(index, first)?;
        tree.link(index, second)?;
        tree.set_time(index, group.time)?;
        cluster_size[index] = size;
        previous_time = group.time;
        for &member in &group.members {
            highest_ancestor[member - 1] = index;
        }
    }

    let tree = tree.finish()?;
    tracing::debug!(
        leaves = tree.num_leaves(),
        root_time = tree.root_time(),
        "ranked tree built from clusters"
    );
    Ok(tree)
}

fn split_groups(s: &str) -> Result<Vec<ClusterGroup>, TreeParseError> {
    let mut groups: Vec<ClusterGroup> = Vec::new();
    let mut rest = s.trim();
    while !rest.is_empty() {
        let group_number = groups.len();
        let Some(body) = rest.strip_prefix('{') else {
            return Err(TreeParseError::cluster(
                group_number,
                "expected '{' at the start of a group",
            ));
        };
        let Some(end) = body.find('}') else {
            return Err(TreeParseError::cluster(group_number, "missing '}'"));
        };
        groups.push(parse_group(&body[..end], group_number)?);
        rest = body[end + 1..].trim_start();
    }
    Ok(groups)
}

fn parse_group(
    body: &str,
    group_number: usize,
) -> Result<ClusterGroup, TreeParseError> {
    let (members_part, time_part) = match body.rsplit_once(':') {
        Some((members, time)) => (members, time),
        None => body.rsplit_once(',').unwrap_or(("", body)),
    };

    let time = time_part.trim().parse::<TreeInt>().map_err(|_| {
        TreeParseError::cluster(
            group_number,
            format!("invalid time '{}'", time_part.trim()),
        )
    })?;

    let mut members: Vec<usize> = Vec::new();
    for entry in members_part.split(',').map(str::trim) {
        if entry.is_empty() {
            continue;
        }
        let member = entry.parse::<usize>().map_err(|_| {
            TreeParseError::cluster(
                group_number,
                format!("invalid leaf number '{entry}'"),
            )
        })?;
        if members.contains(&member) {
            return Err(TreeParseError::cluster(
                group_number,
                format!("leaf {member} listed twice"),
            ));
        }
        members.push(member);
    }

    Ok(ClusterGroup { members, time })
}

/// Converts a ranked tree to its cluster encoding: a baseline group with
/// every leaf at time 0, then one group per internal node in slot order.
///
/// Leaves are numbered by slot, starting at 1, so labels are lost. A tree
/// whose leaves are labelled `"1".."L"` reads back unchanged.
pub fn write_clusters(tree: &Tree) -> String {
    let mut encoding = String::new();
    let leaf_numbers: Vec<String> =
        (1..=tree.num_leaves()).map(|n| n.to_string()).collect();
    encoding.push_str(&format!("{{{},0}}", leaf_numbers.join(",")));

    for ((_, node), cluster) in tree.internal_nodes().zip(tree.clusters()) {
        let members: Vec<String> =
            cluster.iter().map(|leaf| (leaf + 1).to_string()).collect();
        encoding.push_str(&format!("{{{},{}}}", members.join(","), node.time()));
    }
    encoding
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group_separators() {
        let group = parse_group("1, 2, 3", 0).unwrap();
        assert_eq!(group.members, vec![1, 2]);
        assert_eq!(group.time, 3);

        let group = parse_group("4,5:7", 0).unwrap();
        assert_eq!(group.members, vec![4, 5]);
        assert_eq!(group.time, 7);
    }

    #[test]
    fn test_parse_group_rejects_repeated_leaf() {
        assert!(parse_group("1,1,2", 3).is_err());
    }
}
