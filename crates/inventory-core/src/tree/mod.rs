//! Generic ordered tree, the inventory tree builder and read-time filters.

mod builder;
mod filter;
mod node;

pub use builder::{BuildRequest, TreeBuilder};
pub use filter::{sort_key, FilterRow, SortRank, TextFilter, TreeFilter};
pub use node::{ItemId, NodeId, Tree, TreeNode};
