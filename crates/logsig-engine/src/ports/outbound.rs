//! # Outbound Ports (Driven Ports)
//!
//! Collaborators the engine requires from the host: the external signer,
//! a source of IV bytes, and an error sink.

use rand::RngCore;

use crate::domain::block_sig::SignatureScheme;
use crate::domain::errors::{ErrorKind, Result, SigError};
use crate::domain::imprint::Imprint;

/// Turns a block root into a signature blob.
///
/// Production: a timestamping or aggregation service client.
/// Bundled: `Ed25519BlockSigner` (adapters/ed25519_signer.rs)
pub trait BlockSigner: Send + Sync {
    /// Scheme of the blobs this signer produces.
    fn scheme(&self) -> SignatureScheme;

    /// Sign a block root.
    ///
    /// A failure leaves the block open; nothing is written for it.
    fn sign(&self, root: &Imprint) -> Result<Vec<u8>>;
}

/// Checks and upgrades blobs produced by a [`BlockSigner`].
pub trait SignatureVerifier: Send + Sync {
    /// Scheme this verifier understands.
    fn scheme(&self) -> SignatureScheme;

    /// Verify `signature` over `root`.
    fn verify(&self, root: &Imprint, signature: &[u8]) -> Result<()>;

    /// Extend a provisional signature into its final form.
    ///
    /// Schemes whose signatures are final from the start return the input.
    fn extend(&self, signature: &[u8]) -> Result<Vec<u8>> {
        Ok(signature.to_vec())
    }
}

/// Fills the blinding-mask IV of a new block.
pub trait IvSource: Send + Sync {
    /// Fill `iv` with fresh bytes.
    fn fill_iv(&self, iv: &mut [u8]) -> Result<()>;
}

/// Operating-system RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsIvSource;

impl IvSource for OsIvSource {
    fn fill_iv(&self, iv: &mut [u8]) -> Result<()> {
        rand::rngs::OsRng
            .try_fill_bytes(iv)
            .map_err(|e| SigError::with_detail(ErrorKind::Io, format!("os rng: {}", e)))
    }
}

/// Receives error messages independently of return values.
pub trait ErrorHandler: Send + Sync {
    /// Called once per reported failure.
    fn on_error(&self, message: &str);
}

impl<F> ErrorHandler for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_error(&self, message: &str) {
        self(message)
    }
}
