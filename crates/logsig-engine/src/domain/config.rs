//! Signing configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use logsig_engine::SigningConfig;
//! use shared_crypto::HashAlgorithm;
//!
//! let config = SigningConfig::default()
//!     .with_hash_algorithm(HashAlgorithm::Sha3_256)
//!     .with_keep_tree_hashes(true)
//!     .with_block_size_limit(1000);
//! config.validate()?;
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shared_crypto::HashAlgorithm;

use super::errors::{ErrorKind, Result, SigError};

/// Default signature-file suffix.
pub const DEFAULT_SIG_SUFFIX: &str = ".logsig";
/// Default state-file suffix.
pub const DEFAULT_STATE_SUFFIX: &str = ".logstate";
/// Default signer label.
pub const DEFAULT_SIGNER_LABEL: &str = "local-ed25519";

/// Per-context signing settings.
///
/// Open files copy these values when they are opened and never observe
/// later changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Hash algorithm for every imprint.
    pub hash_algorithm: HashAlgorithm,
    /// Write a record-hash TLV per record.
    pub keep_record_hashes: bool,
    /// Write tree-hash TLVs for every leaf and interior node.
    pub keep_tree_hashes: bool,
    /// Records per block; 0 leaves block boundaries to the host.
    pub block_size_limit: u64,
    /// Identity of the external signer.
    pub signer_label: String,
    /// Appended to the log path to name the signature file.
    pub sig_suffix: String,
    /// Appended to the log path to name the state file.
    pub state_suffix: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::Sha2_256,
            keep_record_hashes: false,
            keep_tree_hashes: false,
            block_size_limit: 0,
            signer_label: DEFAULT_SIGNER_LABEL.to_string(),
            sig_suffix: DEFAULT_SIG_SUFFIX.to_string(),
            state_suffix: DEFAULT_STATE_SUFFIX.to_string(),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

impl SigningConfig {
    /// Defaults overridden by `LOGSIG_*` environment variables.
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            hash_algorithm: env::var("LOGSIG_HASH_ALG")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.hash_algorithm),

            keep_record_hashes: env_flag("LOGSIG_KEEP_RECORD_HASHES")
                .unwrap_or(defaults.keep_record_hashes),

            keep_tree_hashes: env_flag("LOGSIG_KEEP_TREE_HASHES")
                .unwrap_or(defaults.keep_tree_hashes),

            block_size_limit: env::var("LOGSIG_BLOCK_SIZE")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.block_size_limit),

            signer_label: env::var("LOGSIG_SIGNER").unwrap_or(defaults.signer_label),

            ..defaults
        }
    }

    /// Check the settings can be used for signing.
    pub fn validate(&self) -> Result<()> {
        if !self.hash_algorithm.is_supported() {
            return Err(SigError::with_detail(
                ErrorKind::HashCreate,
                format!("{} is not available", self.hash_algorithm),
            ));
        }
        if self.sig_suffix.is_empty() || self.state_suffix.is_empty() {
            return Err(SigError::with_detail(
                ErrorKind::Format,
                "file suffixes cannot be empty",
            ));
        }
        if self.sig_suffix == self.state_suffix {
            return Err(SigError::with_detail(
                ErrorKind::Format,
                "signature and state files need different suffixes",
            ));
        }
        Ok(())
    }

    /// Builder-style method to set the hash algorithm
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Builder-style method to retain record hashes
    pub fn with_keep_record_hashes(mut self, keep: bool) -> Self {
        self.keep_record_hashes = keep;
        self
    }

    /// Builder-style method to retain tree hashes
    pub fn with_keep_tree_hashes(mut self, keep: bool) -> Self {
        self.keep_tree_hashes = keep;
        self
    }

    /// Builder-style method to set the block size limit
    pub fn with_block_size_limit(mut self, limit: u64) -> Self {
        self.block_size_limit = limit;
        self
    }

    /// Builder-style method to set the signer label
    pub fn with_signer_label(mut self, label: impl Into<String>) -> Self {
        self.signer_label = label.into();
        self
    }

    /// Builder-style method to set the signature file suffix
    pub fn with_sig_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.sig_suffix = suffix.into();
        self
    }

    /// Signature file paired with a log file.
    pub fn sig_path(&self, log_path: &Path) -> PathBuf {
        with_suffix(log_path, &self.sig_suffix)
    }

    /// State file paired with a log file.
    pub fn state_path(&self, log_path: &Path) -> PathBuf {
        with_suffix(log_path, &self.state_suffix)
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
