//! # Ed25519 Signer
//!
//! Local stand-in for a timestamping service: signs the root imprint bytes
//! with an Ed25519 key. Signatures are final, so extending returns them
//! unchanged.

use shared_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

use crate::domain::block_sig::SignatureScheme;
use crate::domain::errors::Result;
use crate::domain::imprint::Imprint;
use crate::ports::outbound::{BlockSigner, SignatureVerifier};

/// Signs block roots with a local keypair.
pub struct Ed25519BlockSigner {
    keypair: Ed25519KeyPair,
}

impl Ed25519BlockSigner {
    /// Wrap an existing keypair.
    pub fn new(keypair: Ed25519KeyPair) -> Self {
        Self { keypair }
    }

    /// Signer with a fresh random key.
    pub fn generate() -> Self {
        Self::new(Ed25519KeyPair::generate())
    }

    /// Signer from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::new(Ed25519KeyPair::from_seed(seed))
    }

    /// Public half of the key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    /// Verifier for signatures made by this signer.
    pub fn verifier(&self) -> Ed25519SignatureVerifier {
        Ed25519SignatureVerifier::new(self.public_key())
    }
}

impl BlockSigner for Ed25519BlockSigner {
    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::Ed25519
    }

    fn sign(&self, root: &Imprint) -> Result<Vec<u8>> {
        Ok(self.keypair.sign(&root.to_bytes()).as_bytes().to_vec())
    }
}

/// Verifies Ed25519 block signatures against a known public key.
#[derive(Debug, Clone, Copy)]
pub struct Ed25519SignatureVerifier {
    public_key: Ed25519PublicKey,
}

impl Ed25519SignatureVerifier {
    /// Verifier for the given key.
    pub fn new(public_key: Ed25519PublicKey) -> Self {
        Self { public_key }
    }
}

impl SignatureVerifier for Ed25519SignatureVerifier {
    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::Ed25519
    }

    fn verify(&self, root: &Imprint, signature: &[u8]) -> Result<()> {
        let signature = Ed25519Signature::from_slice(signature)?;
        self.public_key.verify(&root.to_bytes(), &signature)?;
        Ok(())
    }
}
