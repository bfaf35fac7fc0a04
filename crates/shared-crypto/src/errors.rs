//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Hash id is not part of the registry
    #[error("Unknown hash algorithm id: 0x{0:02x}")]
    UnknownAlgorithmId(u8),

    /// Hash algorithm name could not be parsed
    #[error("Unknown hash algorithm: {0}")]
    UnknownAlgorithmName(String),

    /// Algorithm is known but no primitive is bundled for it
    #[error("Hash algorithm {0} is not supported by this build")]
    UnsupportedAlgorithm(&'static str),

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid signature format
    #[error("Invalid signature format: expected {expected} bytes, got {actual}")]
    InvalidSignatureFormat {
        /// Expected signature length in bytes
        expected: usize,
        /// Actual signature length in bytes
        actual: usize,
    },

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,
}
