pub(crate) mod arena;
pub(crate) mod builder;
pub(crate) mod discretize;
pub(crate) mod heights;
pub(crate) mod node;
pub(crate) mod tree;

pub use super::{TreeFloat, TreeInt};
