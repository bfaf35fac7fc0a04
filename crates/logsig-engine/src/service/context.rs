//! # Signing Context
//!
//! Configuration and collaborators shared by every file signed under it.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_crypto::HashAlgorithm;
use tracing::{error, info};

use super::signer::FileSigner;
use crate::domain::config::SigningConfig;
use crate::domain::errors::{Result, SigError};
use crate::ports::outbound::{BlockSigner, ErrorHandler, IvSource, OsIvSource};

/// Shared configuration plus the external signer handle.
///
/// Setters affect files opened afterwards only.
pub struct SigningContext {
    config: RwLock<SigningConfig>,
    signer: Arc<dyn BlockSigner>,
    iv_source: Arc<dyn IvSource>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl SigningContext {
    /// Create a context; the configuration is validated first.
    pub fn new(config: SigningConfig, signer: Arc<dyn BlockSigner>) -> Result<Self> {
        config.validate()?;
        info!(
            signer = %config.signer_label,
            scheme = %signer.scheme(),
            algorithm = %config.hash_algorithm,
            "signing context created"
        );
        Ok(Self {
            config: RwLock::new(config),
            signer,
            iv_source: Arc::new(OsIvSource),
            error_handler: None,
        })
    }

    /// Replace the IV source.
    pub fn with_iv_source(mut self, iv_source: Arc<dyn IvSource>) -> Self {
        self.iv_source = iv_source;
        self
    }

    /// Install the error callback.
    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Identity of the external signer.
    pub fn signer_label(&self) -> String {
        self.config.read().signer_label.clone()
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> SigningConfig {
        self.config.read().clone()
    }

    /// Change the hash algorithm for files opened from now on.
    pub fn set_hash_algorithm(&self, algorithm: HashAlgorithm) -> Result<()> {
        let mut config = self.config.write();
        let updated = config.clone().with_hash_algorithm(algorithm);
        updated.validate()?;
        *config = updated;
        Ok(())
    }

    /// Toggle record-hash retention for files opened from now on.
    pub fn set_keep_record_hashes(&self, keep: bool) {
        self.config.write().keep_record_hashes = keep;
    }

    /// Toggle tree-hash retention for files opened from now on.
    pub fn set_keep_tree_hashes(&self, keep: bool) {
        self.config.write().keep_tree_hashes = keep;
    }

    /// Change the block size limit for files opened from now on.
    pub fn set_block_size_limit(&self, limit: u64) {
        self.config.write().block_size_limit = limit;
    }

    /// Open a log file for signing.
    pub fn open_file(self: &Arc<Self>, log_path: &Path) -> Result<FileSigner> {
        FileSigner::open(Arc::clone(self), log_path)
    }

    pub(crate) fn signer(&self) -> &dyn BlockSigner {
        self.signer.as_ref()
    }

    pub(crate) fn iv_source(&self) -> &dyn IvSource {
        self.iv_source.as_ref()
    }

    /// Log an error and pass it to the callback.
    pub(crate) fn report(&self, file: &Path, err: &SigError) {
        error!(file = %file.display(), kind = err.kind().code(), "{}", err);
        if let Some(handler) = &self.error_handler {
            handler.on_error(&format!("{}: {}", file.display(), err));
        }
    }
}

impl std::fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningContext")
            .field("config", &*self.config.read())
            .field("scheme", &self.signer.scheme())
            .field("error_handler", &self.error_handler.is_some())
            .finish_non_exhaustive()
    }
}
