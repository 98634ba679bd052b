/// Traversal state: directory nodes, their arena, and the multi-root forest.
pub mod entry;
pub mod forest;
pub mod node;
pub mod tree;

pub use entry::RawEntry;
pub use forest::{check_disjoint_roots, Forest, ForestStats};
pub use node::{ChildSlot, DirNode, NodeIndex};
pub use tree::DirTree;
