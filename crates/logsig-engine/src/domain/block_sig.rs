//! # Block Signature Record
//!
//! The unit persisted at the end of every block and re-verified later.

use std::fmt;

use shared_crypto::HashAlgorithm;

use super::imprint::Imprint;

/// Signature scheme of the blob inside a block-signature record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    /// KSI aggregation signature.
    Ksi,
    /// RFC 3161 timestamp token.
    Rfc3161,
    /// Detached Ed25519 signature over the root imprint.
    Ed25519,
}

impl SignatureScheme {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            SignatureScheme::Ksi => "KSI",
            SignatureScheme::Rfc3161 => "RFC3161",
            SignatureScheme::Ed25519 => "Ed25519",
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything needed to re-verify one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSignature {
    /// Hash algorithm of every imprint in the block.
    pub hash_algorithm: HashAlgorithm,
    /// Scheme of `signature`.
    pub scheme: SignatureScheme,
    /// Blinding-mask IV used for the block.
    pub iv: Vec<u8>,
    /// Leaf of the last record; the next block chains from it.
    pub last_hash: Imprint,
    /// Records covered.
    pub record_count: u64,
    /// Opaque blob from the external signer.
    pub signature: Vec<u8>,
}
