//! # Adapters Layer
//!
//! Concrete implementations of the outbound ports and of the file handling
//! the signer needs.
//!
//! - `ed25519_signer` - Local Ed25519 `BlockSigner` / `SignatureVerifier`
//! - `lock` - Exclusively locked signature file
//! - `state_store` - Atomic state-file persistence

pub mod ed25519_signer;
pub mod lock;
pub mod state_store;

pub use ed25519_signer::{Ed25519BlockSigner, Ed25519SignatureVerifier};
pub use lock::LockedSigFile;
