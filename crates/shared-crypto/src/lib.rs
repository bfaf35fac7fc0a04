//! # Shared Crypto - Hash and Signature Primitives
//!
//! The primitives the log-signing engine treats as external collaborators.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA1, SHA2, SHA3 | Imprints, mask/leaf/node hashes |
//! | `signatures` | Ed25519 | Local block-root signer |
//!
//! ## Security Properties
//!
//! - **Hash ids**: one byte, stable on the wire, see [`HashAlgorithm`]
//! - **Ed25519**: Deterministic nonces, no RNG dependency

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{DigestHasher, HashAlgorithm};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
