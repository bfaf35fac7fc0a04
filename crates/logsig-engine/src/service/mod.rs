//! # Signing and Verification Services
//!
//! Application layer wiring the domain to the adapters.
//!
//! ## Architecture
//!
//! - `context` - Shared configuration plus the external signer (`SigningContext`)
//! - `signer` - Per-file block lifecycle (`FileSigner`, implements `BlockSigningApi`)
//! - `verifier` - Replays a log against its signature file (`LogVerifier`)
//! - `dump` - Human-readable signature-file listings

pub mod context;
pub mod dump;
pub mod signer;
pub mod verifier;


pub use context::SigningContext;
pub use signer::{CloseError, FileSettings, FileSigner};
pub use verifier::{LogVerifier, VerifyOptions, VerifySummary};
