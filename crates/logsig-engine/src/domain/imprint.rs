//! # Imprint
//!
//! A digest tagged with the one-byte id of the algorithm that produced it.
//! On the wire an imprint is `hash_id || digest`.

use std::fmt;

use shared_crypto::HashAlgorithm;

use super::errors::{ErrorKind, Result, SigError};

/// Hash value tagged with its algorithm.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Imprint {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

/// How two imprints differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImprintMismatch {
    /// Algorithms differ; the bytes were not compared.
    HashId,
    /// Same algorithm, different digest.
    Digest,
}

impl Imprint {
    /// Wrap a digest, checking its length against the algorithm.
    pub fn new(algorithm: HashAlgorithm, digest: Vec<u8>) -> Result<Self> {
        if digest.len() != algorithm.digest_len() {
            return Err(SigError::with_detail(
                ErrorKind::Length,
                format!(
                    "{} digest must be {} bytes, got {}",
                    algorithm,
                    algorithm.digest_len(),
                    digest.len()
                ),
            ));
        }
        Ok(Self { algorithm, digest })
    }

    /// All-zero digest; the chain value before the first block.
    pub fn zero(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            digest: vec![0u8; algorithm.digest_len()],
        }
    }

    /// Parse `hash_id || digest`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (&id, digest) = bytes
            .split_first()
            .ok_or_else(|| SigError::with_detail(ErrorKind::Length, "empty imprint"))?;
        let algorithm = HashAlgorithm::from_id(id)
            .map_err(|e| SigError::with_detail(ErrorKind::Format, e.to_string()))?;
        Self::new(algorithm, digest.to_vec())
    }

    /// Serialize as `hash_id || digest`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.digest.len());
        out.push(self.algorithm.id());
        out.extend_from_slice(&self.digest);
        out
    }

    /// Algorithm that produced the digest.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// One-byte algorithm id.
    pub fn hash_id(&self) -> u8 {
        self.algorithm.id()
    }

    /// Raw digest bytes.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Digest length in bytes.
    pub fn len(&self) -> usize {
        self.digest.len()
    }

    /// Always false for a validated imprint.
    pub fn is_empty(&self) -> bool {
        self.digest.is_empty()
    }

    /// Compare against an expected imprint, id first.
    pub fn check_against(&self, expected: &Imprint) -> std::result::Result<(), ImprintMismatch> {
        if self.algorithm != expected.algorithm {
            return Err(ImprintMismatch::HashId);
        }
        if self.digest != expected.digest {
            return Err(ImprintMismatch::Digest);
        }
        Ok(())
    }

    /// Lowercase hex of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.digest)
    }
}

impl fmt::Debug for Imprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imprint({:02x}.{})", self.hash_id(), self.to_hex())
    }
}

impl fmt::Display for Imprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}.{}", self.hash_id(), self.to_hex())
    }
}
