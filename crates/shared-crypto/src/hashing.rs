//! # Hash Algorithm Registry
//!
//! One-byte hash identifiers as they appear in imprints, plus a streaming
//! hasher that dispatches to the RustCrypto implementations.
//!
//! ## Identifiers
//!
//! | Id | Algorithm | Digest |
//! |----|-----------|--------|
//! | 0x00 | SHA1 | 20 |
//! | 0x01 | SHA2-256 | 32 |
//! | 0x02 | RIPEMD-160 | 20 (not bundled) |
//! | 0x03 | SHA2-224 | 28 |
//! | 0x04 | SHA2-384 | 48 |
//! | 0x05 | SHA2-512 | 64 |
//! | 0x07 | SHA3-224 | 28 |
//! | 0x08 | SHA3-256 | 32 |
//! | 0x09 | SHA3-384 | 48 |
//! | 0x0A | SHA3-512 | 64 |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Digest;

use crate::CryptoError;

/// Hash algorithms addressable by a one-byte id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-1 (legacy)
    Sha1,
    /// SHA-256
    Sha2_256,
    /// RIPEMD-160
    Ripemd160,
    /// SHA-224
    Sha2_224,
    /// SHA-384
    Sha2_384,
    /// SHA-512
    Sha2_512,
    /// SHA3-224
    Sha3_224,
    /// SHA3-256
    Sha3_256,
    /// SHA3-384
    Sha3_384,
    /// SHA3-512
    Sha3_512,
}

impl HashAlgorithm {
    /// Every registered algorithm, in id order.
    pub const ALL: [HashAlgorithm; 10] = [
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha2_256,
        HashAlgorithm::Ripemd160,
        HashAlgorithm::Sha2_224,
        HashAlgorithm::Sha2_384,
        HashAlgorithm::Sha2_512,
        HashAlgorithm::Sha3_224,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Sha3_384,
        HashAlgorithm::Sha3_512,
    ];

    /// Wire identifier.
    pub fn id(self) -> u8 {
        match self {
            HashAlgorithm::Sha1 => 0x00,
            HashAlgorithm::Sha2_256 => 0x01,
            HashAlgorithm::Ripemd160 => 0x02,
            HashAlgorithm::Sha2_224 => 0x03,
            HashAlgorithm::Sha2_384 => 0x04,
            HashAlgorithm::Sha2_512 => 0x05,
            HashAlgorithm::Sha3_224 => 0x07,
            HashAlgorithm::Sha3_256 => 0x08,
            HashAlgorithm::Sha3_384 => 0x09,
            HashAlgorithm::Sha3_512 => 0x0A,
        }
    }

    /// Look up an algorithm by wire identifier.
    pub fn from_id(id: u8) -> Result<Self, CryptoError> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.id() == id)
            .ok_or(CryptoError::UnknownAlgorithmId(id))
    }

    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha1 | HashAlgorithm::Ripemd160 => 20,
            HashAlgorithm::Sha2_224 | HashAlgorithm::Sha3_224 => 28,
            HashAlgorithm::Sha2_256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha2_384 | HashAlgorithm::Sha3_384 => 48,
            HashAlgorithm::Sha2_512 | HashAlgorithm::Sha3_512 => 64,
        }
    }

    /// Canonical display name.
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha2_256 => "SHA2-256",
            HashAlgorithm::Ripemd160 => "RIPEMD-160",
            HashAlgorithm::Sha2_224 => "SHA2-224",
            HashAlgorithm::Sha2_384 => "SHA2-384",
            HashAlgorithm::Sha2_512 => "SHA2-512",
            HashAlgorithm::Sha3_224 => "SHA3-224",
            HashAlgorithm::Sha3_256 => "SHA3-256",
            HashAlgorithm::Sha3_384 => "SHA3-384",
            HashAlgorithm::Sha3_512 => "SHA3-512",
        }
    }

    /// Whether a primitive is bundled for this algorithm.
    pub fn is_supported(self) -> bool {
        !matches!(self, HashAlgorithm::Ripemd160)
    }

    /// Hash a sequence of byte slices as if they were concatenated.
    pub fn hash_many(self, parts: &[&[u8]]) -> Result<Vec<u8>, CryptoError> {
        let mut hasher = DigestHasher::new(self)?;
        for part in parts {
            hasher.update(part);
        }
        Ok(hasher.finalize())
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha2_256
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CryptoError::UnknownAlgorithmName(wanted.to_string()))
    }
}

enum Inner {
    Sha1(sha1::Sha1),
    Sha2_224(sha2::Sha224),
    Sha2_256(sha2::Sha256),
    Sha2_384(sha2::Sha384),
    Sha2_512(sha2::Sha512),
    Sha3_224(sha3::Sha3_224),
    Sha3_256(sha3::Sha3_256),
    Sha3_384(sha3::Sha3_384),
    Sha3_512(sha3::Sha3_512),
}

/// Stateful hasher for any supported [`HashAlgorithm`].
pub struct DigestHasher {
    algorithm: HashAlgorithm,
    inner: Inner,
}

impl DigestHasher {
    /// Create new hasher.
    pub fn new(algorithm: HashAlgorithm) -> Result<Self, CryptoError> {
        let inner = match algorithm {
            HashAlgorithm::Sha1 => Inner::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha2_224 => Inner::Sha2_224(sha2::Sha224::new()),
            HashAlgorithm::Sha2_256 => Inner::Sha2_256(sha2::Sha256::new()),
            HashAlgorithm::Sha2_384 => Inner::Sha2_384(sha2::Sha384::new()),
            HashAlgorithm::Sha2_512 => Inner::Sha2_512(sha2::Sha512::new()),
            HashAlgorithm::Sha3_224 => Inner::Sha3_224(sha3::Sha3_224::new()),
            HashAlgorithm::Sha3_256 => Inner::Sha3_256(sha3::Sha3_256::new()),
            HashAlgorithm::Sha3_384 => Inner::Sha3_384(sha3::Sha3_384::new()),
            HashAlgorithm::Sha3_512 => Inner::Sha3_512(sha3::Sha3_512::new()),
            HashAlgorithm::Ripemd160 => {
                return Err(CryptoError::UnsupportedAlgorithm(algorithm.name()))
            }
        };
        Ok(Self { algorithm, inner })
    }

    /// Algorithm this hasher was created for.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        match &mut self.inner {
            Inner::Sha1(h) => h.update(data),
            Inner::Sha2_224(h) => h.update(data),
            Inner::Sha2_256(h) => h.update(data),
            Inner::Sha2_384(h) => h.update(data),
            Inner::Sha2_512(h) => h.update(data),
            Inner::Sha3_224(h) => h.update(data),
            Inner::Sha3_256(h) => h.update(data),
            Inner::Sha3_384(h) => h.update(data),
            Inner::Sha3_512(h) => h.update(data),
        }
        self
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Vec<u8> {
        match self.inner {
            Inner::Sha1(h) => h.finalize().to_vec(),
            Inner::Sha2_224(h) => h.finalize().to_vec(),
            Inner::Sha2_256(h) => h.finalize().to_vec(),
            Inner::Sha2_384(h) => h.finalize().to_vec(),
            Inner::Sha2_512(h) => h.finalize().to_vec(),
            Inner::Sha3_224(h) => h.finalize().to_vec(),
            Inner::Sha3_256(h) => h.finalize().to_vec(),
            Inner::Sha3_384(h) => h.finalize().to_vec(),
            Inner::Sha3_512(h) => h.finalize().to_vec(),
        }
    }
}
