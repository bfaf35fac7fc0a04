//! # Log Signature Engine
//!
//! Incremental, block-based signing of append-only log files, and offline
//! verification of the result.
//!
//! Records are hashed as they arrive into a Merkle forest of at most 64
//! roots. When a block ends, the forest is folded into one root, the root
//! is signed by an external [`BlockSigner`], and a block-signature record is
//! appended to `<log>.logsig`. Every leaf is blinded by a mask derived from
//! the previous leaf and a per-block IV, which chains blocks together.
//!
//! ## Architecture
//!
//! ```text
//! host pipeline ──add_record──> FileSigner ──root──> BlockSigner
//!                                   │
//!                                   ├──TLVs──> <log>.logsig
//!                                   └──last leaf──> <log>.logstate
//!
//! <log> + <log>.logsig ──> LogVerifier ──> ErrorContext
//! ```
//!
//! - **Domain Layer** (`domain/`): errors, imprints, hashing, Merkle forest
//! - **Codec Layer** (`codec/`): TLV framing, block-signature and state-file formats
//! - **Ports Layer** (`ports/`): `BlockSigningApi` inbound; signer, verifier, IV, errors outbound
//! - **Adapters Layer** (`adapters/`): Ed25519 signer, file lock, state store
//! - **Service Layer** (`service/`): `SigningContext`, `FileSigner`, `LogVerifier`
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use logsig_engine::{BlockSigningApi, Ed25519BlockSigner, SigningConfig, SigningContext};
//!
//! let ctx = Arc::new(SigningContext::new(
//!     SigningConfig::default().with_block_size_limit(1024),
//!     Arc::new(Ed25519BlockSigner::generate()),
//! )?);
//! let mut file = ctx.open_file(Path::new("/var/log/app.log"))?;
//! file.add_record(b"service started")?;
//! file.finish_block()?;
//! ```

#![warn(missing_docs)]

pub mod adapters;
pub mod codec;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{Ed25519BlockSigner, Ed25519SignatureVerifier, LockedSigFile};
pub use domain::block_sig::{BlockSignature, SignatureScheme};
pub use domain::config::SigningConfig;
pub use domain::error_context::ErrorContext;
pub use domain::errors::{ErrorKind, Result, SigError};
pub use domain::forest::{MerkleForest, MAX_ROOTS};
pub use domain::imprint::Imprint;
pub use ports::inbound::BlockSigningApi;
pub use ports::outbound::{BlockSigner, ErrorHandler, IvSource, OsIvSource, SignatureVerifier};
pub use service::{
    CloseError, FileSettings, FileSigner, LogVerifier, SigningContext, VerifyOptions,
    VerifySummary,
};
pub use shared_crypto::HashAlgorithm;
