// -------------------------------------
// #![allow(dead_code)]
// #![allow(unused_imports)]
// #![allow(unused_variables)]
// #![allow(clippy::needless_range_loop)]
// -------------------------------------

mod parsers;
mod phylo;

pub type TreeFloat = f64;
pub type TreeInt = i64;

pub use parsers::BatchError;
pub use parsers::TreeParseError;
pub use parsers::clusters::parse_clusters;
pub use parsers::clusters::write_clusters;
pub use parsers::newick::parse_newick;
pub use parsers::newick::parse_newick_arena;
pub use parsers::newick::parse_newick_batch;
pub use parsers::newick::rank_parsed_tree;
pub use parsers::newick::read_newick_file;
pub use parsers::newick::write_newick;
pub use parsers::nexus::parse_nexus;
pub use parsers::nexus::read_nexus_file;
pub use parsers::parse_trees;
pub use phylo::arena::NodeId;
pub use phylo::arena::NodeKind;
pub use phylo::arena::ParsedNode;
pub use phylo::arena::ParsedTree;
pub use phylo::builder::build_tree;
pub use phylo::discretize::Discretization;
pub use phylo::discretize::DiscretizationError;
pub use phylo::discretize::discretize;
pub use phylo::heights::RECONCILIATION_WARN_THRESHOLD;
pub use phylo::heights::reconcile_heights;
pub use phylo::node::NO_NODE;
pub use phylo::node::Node;
pub use phylo::tree::Tree;
pub use phylo::tree::TreeError;
pub use phylo::tree::TreeList;
