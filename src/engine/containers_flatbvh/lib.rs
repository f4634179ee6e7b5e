mod node_index;
pub use node_index::*;

mod node_pool;
pub use node_pool::*;

pub mod aabb_tree;
pub use aabb_tree::{AabbTree, AabbTreeConfig, MaintenanceThresholds, TreeError, TreeKey};
