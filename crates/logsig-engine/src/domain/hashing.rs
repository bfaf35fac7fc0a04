//! # Hash Primitives
//!
//! The three combinations every leaf and node goes through:
//!
//! ```text
//! mask   m    = H( imprint(x_prev) || iv )
//! record r    = H( record )
//! leaf        = H( 0x01 || imprint(m) || imprint(r) )
//! node        = H( level || imprint(left) || imprint(right) )
//! ```
//!
//! `x_prev` is the previous leaf in the chain, so a mask can only be
//! reproduced by someone who replays the chain with the block's IV.

use shared_crypto::HashAlgorithm;

use super::errors::Result;
use super::imprint::Imprint;

/// Level byte of a leaf (a record joined with its mask).
pub const LEAF_LEVEL: u8 = 1;

/// Record hash and the masked leaf derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedLeaf {
    /// `H(record)`; what a retained record-hash TLV holds.
    pub record_hash: Imprint,
    /// Value entering the forest.
    pub leaf: Imprint,
}

fn digest(algorithm: HashAlgorithm, parts: &[&[u8]]) -> Result<Imprint> {
    let bytes = algorithm.hash_many(parts)?;
    Imprint::new(algorithm, bytes)
}

/// Blinding mask for the next record.
pub fn hash_m(algorithm: HashAlgorithm, x_prev: &Imprint, iv: &[u8]) -> Result<Imprint> {
    digest(algorithm, &[&x_prev.to_bytes(), iv])
}

/// Plain hash of the record bytes.
pub fn record_hash(algorithm: HashAlgorithm, record: &[u8]) -> Result<Imprint> {
    digest(algorithm, &[record])
}

/// Parent of two subtrees; the level byte is hashed first.
pub fn hash_node(
    algorithm: HashAlgorithm,
    left: &Imprint,
    right: &Imprint,
    level: u8,
) -> Result<Imprint> {
    digest(algorithm, &[&[level], &left.to_bytes(), &right.to_bytes()])
}

/// Leaf from a mask and an already computed record hash.
pub fn masked_leaf(algorithm: HashAlgorithm, mask: &Imprint, record_hash: &Imprint) -> Result<Imprint> {
    hash_node(algorithm, mask, record_hash, LEAF_LEVEL)
}

/// Hash a record and mask it into a leaf.
pub fn hash_r(algorithm: HashAlgorithm, mask: &Imprint, record: &[u8]) -> Result<MaskedLeaf> {
    let record_hash = record_hash(algorithm, record)?;
    let leaf = masked_leaf(algorithm, mask, &record_hash)?;
    Ok(MaskedLeaf { record_hash, leaf })
}
