//! # Forest Module
//!
//! Incremental Merkle forest: one partial root per tree level, folded into
//! a single root when the block is finished.

mod engine;


pub use engine::{MerkleForest, TreeNode, MAX_ROOTS};
