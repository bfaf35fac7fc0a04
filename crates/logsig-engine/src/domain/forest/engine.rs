//! # Merkle Forest
//!
//! Records arrive one at a time; the forest keeps at most one subtree root
//! per level, exactly like the set bits of a binary counter.
//!
//! ## Algorithm
//!
//! Slot `j` holds a subtree whose root carries level `j + 1` (a bare leaf
//! sits in slot 0 at level 1). Adding a leaf is a carry:
//!
//! ```text
//! slot:    0   1   2            0   1   2
//! before: [a] [b] [ ]   +x  => [ ] [ ] [N(b, N(a, x, 2), 3)]
//! ```
//!
//! Finishing folds from the lowest valid slot upward, the accumulator always
//! on the right: `acc = N(slot[j], acc, j + 2)`.
//!
//! ## Bounds
//!
//! 64 slots cover 2^64 - 1 records. A carry out of the top slot is rejected
//! before any slot is touched.

use shared_crypto::HashAlgorithm;

use crate::domain::errors::{ErrorKind, Result, SigError};
use crate::domain::hashing::hash_node;
use crate::domain::imprint::Imprint;

/// Number of forest slots.
pub const MAX_ROOTS: usize = 64;

// =============================================================================
// FOREST TYPES
// =============================================================================

/// Interior node produced while carrying a new leaf upward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Level byte the node was hashed with.
    pub level: u8,
    /// Node hash.
    pub hash: Imprint,
}

/// Fixed-capacity forest of partial roots.
#[derive(Clone)]
pub struct MerkleForest {
    algorithm: HashAlgorithm,
    roots: [Option<Imprint>; MAX_ROOTS],
    leaves: u64,
}

impl MerkleForest {
    /// Empty forest for the given algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            roots: std::array::from_fn(|_| None),
            leaves: 0,
        }
    }

    /// Algorithm used for node hashes.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Leaves added since the last clear.
    pub fn leaf_count(&self) -> u64 {
        self.leaves
    }

    /// True when no leaf has been added since the last clear.
    pub fn is_empty(&self) -> bool {
        self.leaves == 0
    }

    /// Partial root at slot `j`, if any.
    pub fn slot(&self, j: usize) -> Option<&Imprint> {
        self.roots.get(j).and_then(Option::as_ref)
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.roots.iter().filter(|r| r.is_some()).count()
    }

    /// Add a leaf, returning the interior nodes created, lowest first.
    ///
    /// # Errors
    ///
    /// - `Length` if every slot is already occupied
    /// - `HashCreate` if the hash primitive fails; the forest is unchanged
    pub fn push(&mut self, leaf: Imprint) -> Result<Vec<TreeNode>> {
        let carry_len = self
            .roots
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| SigError::with_detail(ErrorKind::Length, "merkle forest is full"))?;

        let mut created = Vec::with_capacity(carry_len);
        let mut carry = leaf;
        for (j, slot) in self.roots[..carry_len].iter().enumerate() {
            // carry_len stops at the first empty slot
            let existing = slot.as_ref().ok_or(ErrorKind::Format)?;
            let level = (j + 2) as u8;
            let parent = hash_node(self.algorithm, existing, &carry, level)?;
            created.push(TreeNode {
                level,
                hash: parent.clone(),
            });
            carry = parent;
        }

        for slot in &mut self.roots[..carry_len] {
            *slot = None;
        }
        self.roots[carry_len] = Some(carry);
        self.leaves += 1;
        Ok(created)
    }

    /// Fold every valid slot into the block root without consuming the forest.
    ///
    /// A single-leaf forest returns the leaf itself.
    ///
    /// # Errors
    ///
    /// `InvalidRecordCount` if the forest is empty.
    pub fn root(&self) -> Result<Imprint> {
        let mut acc: Option<Imprint> = None;
        for (j, slot) in self.roots.iter().enumerate() {
            let Some(hash) = slot else { continue };
            acc = Some(match acc {
                None => hash.clone(),
                Some(right) => hash_node(self.algorithm, hash, &right, (j + 2) as u8)?,
            });
        }
        acc.ok_or_else(|| SigError::with_detail(ErrorKind::InvalidRecordCount, "empty block"))
    }

    /// Drop every partial root.
    pub fn clear(&mut self) {
        for slot in &mut self.roots {
            *slot = None;
        }
        self.leaves = 0;
    }
}

impl std::fmt::Debug for MerkleForest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let occupied: Vec<usize> = (0..MAX_ROOTS).filter(|j| self.roots[*j].is_some()).collect();
        f.debug_struct("MerkleForest")
            .field("algorithm", &self.algorithm)
            .field("leaves", &self.leaves)
            .field("occupied", &occupied)
            .finish()
    }
}
