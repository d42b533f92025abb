//! Nearest-neighbor indexing over an injected metric.

mod cover_tree;

pub use cover_tree::CoverTree;
