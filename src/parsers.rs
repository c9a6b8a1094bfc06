pub(crate) mod clusters;
pub(crate) mod newick;
pub(crate) mod nexus;

use super::phylo::discretize::{Discretization, DiscretizationError};
use super::phylo::tree::{TreeError, TreeList};
use newick::parse_newick_batch;
use nexus::{is_tree_statement, parse_nexus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeParseError {
    #[error("Malformed NEWICK at byte {position}: {message}.")]
    MalformedNewick { position: usize, message: String },
    #[error("Malformed cluster #{cluster}: {message}.")]
    MalformedCluster { cluster: usize, message: String },
    #[error(transparent)]
    Discretization(#[from] DiscretizationError),
    #[error(transparent)]
    TreeError(#[from] TreeError),
}

impl TreeParseError {
    pub(crate) fn newick(position: usize, message: impl Into<String>) -> Self {
        Self::MalformedNewick { position, message: message.into() }
    }

    pub(crate) fn cluster(cluster: usize, message: impl Into<String>) -> Self {
        Self::MalformedCluster { cluster, message: message.into() }
    }
}

/// Failure of a multi-tree read. Nothing read before the failure is kept.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Tree on line {line} could not be read: {source}")]
    TreeStatement {
        line: usize,
        #[source]
        source: TreeParseError,
    },
    #[error("Tree statement on line {line} contains no parenthesised tree.")]
    MissingNewick { line: usize },
}

/// Reads every tree in `s`, which may be a NEXUS file or plain NEWICK with
/// one tree per line.
pub fn parse_trees(
    s: &str,
    discretization: Discretization,
) -> Result<TreeList, BatchError> {
    if looks_like_nexus(s) {
        let trees = parse_nexus(s, discretization)?;
        tracing::debug!(trees = trees.len(), "NEXUS input");
        Ok(trees)
    } else {
        let trees = parse_newick_batch(s, discretization)?;
        tracing::debug!(trees = trees.len(), "NEWICK input");
        Ok(trees)
    }
}

fn looks_like_nexus(s: &str) -> bool {
    let has_header = s
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.to_uppercase().starts_with("#NEXUS"));
    has_header || s.lines().any(is_tree_statement)
}
