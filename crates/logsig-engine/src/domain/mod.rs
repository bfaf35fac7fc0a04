//! # Domain Layer
//!
//! Pure signing logic: no files, no signer, no clock.
//!
//! ## Modules
//!
//! - `errors` - Flat error taxonomy and `SigError`
//! - `imprint` - Algorithm-tagged hash values
//! - `hashing` - Mask, leaf and node hash combinations
//! - `forest` - Incremental 64-slot Merkle forest
//! - `block_sig` - Block-signature record
//! - `error_context` - Verification diagnostics
//! - `config` - Signing configuration

pub mod block_sig;
pub mod config;
pub mod error_context;
pub mod errors;
pub mod forest;
pub mod hashing;
pub mod imprint;
