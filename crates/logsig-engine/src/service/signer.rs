//! # File Signer
//!
//! Per-log-file block-signature lifecycle.
//!
//! ## Lifecycle
//!
//! ```text
//! open ──> [idle] ──add_record / init_block──> [block open] ──finish_block──> [idle]
//!                                                  │
//!                                                  └──discard_block──> [idle]
//! ```
//!
//! ## Guarantees
//!
//! - Records are hashed strictly in the order `add_record` sees them
//! - A block-signature record is either written whole and synced, or not at all
//! - A failed signing call leaves the block open so the caller can retry
//! - The state file trails the signature file by at most one block, and on
//!   open the last block signature in the signature file wins

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shared_crypto::HashAlgorithm;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::context::SigningContext;
use crate::adapters::lock::LockedSigFile;
use crate::adapters::state_store;
use crate::codec::tlv::{self, TlvRecord, SIG_FILE_MAGIC};
use crate::codec::{block_sig, types};
use crate::domain::block_sig::BlockSignature;
use crate::domain::config::SigningConfig;
use crate::domain::errors::{ErrorKind, Result, SigError};
use crate::domain::forest::{MerkleForest, TreeNode};
use crate::domain::hashing::{hash_m, hash_r, MaskedLeaf};
use crate::domain::imprint::Imprint;
use crate::ports::inbound::BlockSigningApi;

// =============================================================================
// FILE SETTINGS
// =============================================================================

/// Context settings copied when the file was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSettings {
    /// Hash algorithm for every imprint of this file.
    pub hash_algorithm: HashAlgorithm,
    /// Record hashes are written per record.
    pub keep_record_hashes: bool,
    /// Tree hashes are written per leaf and interior node.
    pub keep_tree_hashes: bool,
    /// Records per block; 0 means the host decides.
    pub block_size_limit: u64,
}

impl From<&SigningConfig> for FileSettings {
    fn from(config: &SigningConfig) -> Self {
        Self {
            hash_algorithm: config.hash_algorithm,
            keep_record_hashes: config.keep_record_hashes,
            keep_tree_hashes: config.keep_tree_hashes,
            block_size_limit: config.block_size_limit,
        }
    }
}

/// Returned by [`FileSigner::close`].
#[derive(Debug, Error)]
pub enum CloseError {
    /// A block is still open; the handle is handed back unchanged.
    #[error("cannot close: block with {records} records still open")]
    BlockOpen {
        /// Records hashed into the open block.
        records: u64,
        /// The untouched handle.
        signer: Box<FileSigner>,
    },

    /// Final sync of the signature file failed.
    #[error(transparent)]
    Sync(#[from] SigError),
}

impl CloseError {
    /// Recover the handle from a refused close.
    pub fn into_signer(self) -> Option<FileSigner> {
        match self {
            CloseError::BlockOpen { signer, .. } => Some(*signer),
            CloseError::Sync(_) => None,
        }
    }
}

/// What an existing signature file says about the chain.
struct Recovered {
    last_block: Option<BlockSignature>,
    blocks: u64,
    valid_len: u64,
}

// =============================================================================
// FILE SIGNER
// =============================================================================

/// Signing state of one log file.
pub struct FileSigner {
    ctx: Arc<SigningContext>,
    settings: FileSettings,
    disabled: bool,
    iv: Vec<u8>,
    x_prev: Imprint,
    block_start_x_prev: Imprint,
    log_path: PathBuf,
    sig_path: PathBuf,
    state_path: PathBuf,
    out: LockedSigFile,
    out_len: u64,
    block_start_offset: u64,
    first_leaf: Option<Imprint>,
    records_in_block: u64,
    block_open: bool,
    forest: MerkleForest,
    blocks_finished: u64,
}

impl FileSigner {
    /// Open `log_path` for signing under `ctx`.
    ///
    /// Locks the signature file, recovers the chain from it, and writes the
    /// magic header if the file is new.
    pub fn open(ctx: Arc<SigningContext>, log_path: &Path) -> Result<Self> {
        let config = ctx.config();
        let settings = FileSettings::from(&config);
        let sig_path = config.sig_path(log_path);
        let state_path = config.state_path(log_path);

        let mut out = LockedSigFile::acquire(&sig_path)?;
        let recovered = Self::recover(&mut out)?;

        let x_prev = match &recovered.last_block {
            Some(last) => {
                Self::reconcile_state(&ctx, &state_path, &last.last_hash);
                last.last_hash.clone()
            }
            None => {
                if state_path.exists() {
                    warn!(
                        file = %log_path.display(),
                        "state file present but signature file has no blocks; starting a new chain"
                    );
                }
                Imprint::zero(settings.hash_algorithm)
            }
        };

        info!(
            file = %log_path.display(),
            blocks = recovered.blocks,
            algorithm = %settings.hash_algorithm,
            signer = %config.signer_label,
            "opened log file for signing"
        );

        Ok(Self {
            ctx,
            settings,
            disabled: false,
            iv: Vec::new(),
            block_start_x_prev: x_prev.clone(),
            x_prev,
            log_path: log_path.to_path_buf(),
            sig_path,
            state_path,
            out,
            out_len: recovered.valid_len,
            block_start_offset: recovered.valid_len,
            first_leaf: None,
            records_in_block: 0,
            block_open: false,
            forest: MerkleForest::new(settings.hash_algorithm),
            blocks_finished: 0,
        })
    }

    /// Scan an existing signature file, cutting anything after the last
    /// complete block signature.
    fn recover(out: &mut LockedSigFile) -> Result<Recovered> {
        let bytes = out.read_all()?;
        let header_len = SIG_FILE_MAGIC.len() as u64;

        if bytes.len() < SIG_FILE_MAGIC.len() && SIG_FILE_MAGIC.starts_with(&bytes) {
            // new file, or the header itself was torn
            out.truncate(0)?;
            tlv::write_file_header(out)?;
            return Ok(Recovered {
                last_block: None,
                blocks: 0,
                valid_len: header_len,
            });
        }

        let mut cursor = bytes.as_slice();
        tlv::check_file_header(&mut cursor)?;

        let mut pos = header_len;
        let mut recovered = Recovered {
            last_block: None,
            blocks: 0,
            valid_len: header_len,
        };
        loop {
            match tlv::read_record(&mut cursor) {
                Ok(rec) => {
                    pos += rec.encoded_len() as u64;
                    if rec.tlv_type() == types::BLOCK_SIG {
                        recovered.last_block = Some(block_sig::decode(&rec)?);
                        recovered.blocks += 1;
                        recovered.valid_len = pos;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Eof => break,
                Err(e) if e.kind() == ErrorKind::EndOfSig => {
                    warn!(file = %out.path().display(), "torn record at end of signature file");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let total = bytes.len() as u64;
        if recovered.valid_len < total {
            warn!(
                file = %out.path().display(),
                dropped = total - recovered.valid_len,
                "discarding hashes of an unfinished block"
            );
            out.truncate(recovered.valid_len)?;
        }
        Ok(recovered)
    }

    /// Bring the state file in line with the last block signature.
    fn reconcile_state(ctx: &SigningContext, state_path: &Path, last_hash: &Imprint) {
        let current = match state_store::load(state_path) {
            Ok(state) => state,
            Err(e) => {
                warn!(file = %state_path.display(), error = %e, "unreadable state file");
                None
            }
        };
        if current.as_ref() == Some(last_hash) {
            return;
        }
        if current.is_some() {
            warn!(
                file = %state_path.display(),
                "stale state file; chaining from the last block signature"
            );
        }
        if let Err(e) = state_store::save(state_path, last_hash) {
            ctx.report(state_path, &e);
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Settings mirrored from the context at open time.
    pub fn settings(&self) -> FileSettings {
        self.settings
    }

    /// Log file this handle signs.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Signature file path.
    pub fn sig_path(&self) -> &Path {
        &self.sig_path
    }

    /// State file path.
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Whether signing is turned off for this file.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Turn signing off or back on without losing state.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Whether a block is open.
    pub fn is_block_open(&self) -> bool {
        self.block_open
    }

    /// Records hashed into the open block.
    pub fn records_in_block(&self) -> u64 {
        self.records_in_block
    }

    /// Blocks signed through this handle.
    pub fn blocks_finished(&self) -> u64 {
        self.blocks_finished
    }

    /// Last leaf in the chain.
    pub fn last_leaf(&self) -> &Imprint {
        &self.x_prev
    }

    /// First leaf of the open block.
    pub fn first_leaf(&self) -> Option<&Imprint> {
        self.first_leaf.as_ref()
    }

    /// IV of the open block.
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    #[cfg(test)]
    pub(crate) fn set_write_budget(&mut self, budget: Option<usize>) {
        self.out.set_write_budget(budget);
    }

    fn limit_reached(&self) -> bool {
        self.settings.block_size_limit > 0
            && self.records_in_block >= self.settings.block_size_limit
    }

    /// Disable the file after a signature-stream failure.
    fn fail_stream(&mut self, err: &SigError) {
        self.disabled = true;
        self.ctx.report(&self.sig_path, err);
    }

    fn append(&mut self, rec: &TlvRecord) -> Result<()> {
        if let Err(e) = tlv::write_record(&mut self.out, rec) {
            self.fail_stream(&e);
            return Err(e);
        }
        self.out_len += rec.encoded_len() as u64;
        Ok(())
    }

    fn append_imprint(&mut self, tlv_type: u16, imprint: &Imprint) -> Result<()> {
        let rec = TlvRecord::new(tlv_type, imprint.to_bytes())?;
        self.append(&rec)
    }

    fn append_retained(&mut self, record_hash: &Imprint, leaf: &Imprint, nodes: &[TreeNode]) -> Result<()> {
        if self.settings.keep_record_hashes {
            self.append_imprint(types::RECORD_HASH, record_hash)?;
        }
        if self.settings.keep_tree_hashes {
            self.append_imprint(types::TREE_HASH, leaf)?;
            for node in nodes {
                self.append_imprint(types::TREE_HASH, &node.hash)?;
            }
        }
        Ok(())
    }

    fn reset_block(&mut self) {
        self.forest.clear();
        self.records_in_block = 0;
        self.first_leaf = None;
        self.block_open = false;
    }

    /// Close the handle; refuses while a block holds records.
    pub fn close(mut self) -> std::result::Result<(), CloseError> {
        if self.block_open && self.records_in_block > 0 {
            return Err(CloseError::BlockOpen {
                records: self.records_in_block,
                signer: Box::new(self),
            });
        }
        self.block_open = false;
        info!(
            file = %self.log_path.display(),
            blocks = self.blocks_finished,
            "closing signed log file"
        );
        self.out.sync()?;
        Ok(())
    }
}

impl BlockSigningApi for FileSigner {
    fn init_block(&mut self) -> Result<()> {
        if self.disabled {
            return Ok(());
        }
        if self.block_open && self.records_in_block > 0 {
            return Err(SigError::with_detail(ErrorKind::Format, "block already open"));
        }

        let mut iv = vec![0u8; self.settings.hash_algorithm.digest_len()];
        self.ctx.iv_source().fill_iv(&mut iv)?;

        self.reset_block();
        self.iv = iv;
        self.block_start_x_prev = self.x_prev.clone();
        self.block_start_offset = self.out_len;
        self.block_open = true;
        debug!(file = %self.log_path.display(), block = self.blocks_finished + 1, "block opened");
        Ok(())
    }

    fn add_record(&mut self, record: &[u8]) -> Result<()> {
        if self.disabled {
            return Ok(());
        }

        // an earlier auto-finish failed; try again before growing the block
        let mut retry_failed = false;
        if self.block_open && self.limit_reached() {
            if let Err(e) = self.finish_block() {
                if self.disabled {
                    return Err(e);
                }
                warn!(
                    file = %self.log_path.display(),
                    records = self.records_in_block,
                    "block over size limit, signing still failing"
                );
                retry_failed = true;
            }
        }

        if !self.block_open {
            self.init_block()?;
        }

        let alg = self.settings.hash_algorithm;
        let mask = hash_m(alg, &self.x_prev, &self.iv)?;
        let MaskedLeaf { record_hash, leaf } = hash_r(alg, &mask, record)?;

        // the record counts only once all of its retained hashes are on disk
        let mut forest = self.forest.clone();
        let nodes = forest.push(leaf.clone())?;
        let record_start = self.out_len;
        if let Err(e) = self.append_retained(&record_hash, &leaf, &nodes) {
            // hashes of this record already written, and any torn tail, go too
            let _ = self.out.truncate(record_start);
            self.out_len = record_start;
            return Err(e);
        }
        self.forest = forest;

        if self.first_leaf.is_none() {
            self.first_leaf = Some(leaf.clone());
        }
        self.x_prev = leaf;
        self.records_in_block += 1;

        if !retry_failed && self.limit_reached() {
            if let Err(e) = self.finish_block() {
                if self.disabled {
                    return Err(e);
                }
                // already reported; the block stays open and is retried on the next record
            }
        }
        Ok(())
    }

    fn finish_block(&mut self) -> Result<BlockSignature> {
        if self.disabled {
            return Err(SigError::with_detail(
                ErrorKind::Io,
                "signing disabled for this file",
            ));
        }
        if !self.block_open || self.records_in_block == 0 {
            return Err(SigError::with_detail(
                ErrorKind::InvalidRecordCount,
                "no records in block",
            ));
        }

        let root = self.forest.root()?;
        let signature = match self.ctx.signer().sign(&root) {
            Ok(signature) => signature,
            Err(e) => {
                self.ctx.report(&self.log_path, &e);
                return Err(e);
            }
        };

        let sig = BlockSignature {
            hash_algorithm: self.settings.hash_algorithm,
            scheme: self.ctx.signer().scheme(),
            iv: self.iv.clone(),
            last_hash: self.x_prev.clone(),
            record_count: self.records_in_block,
            signature,
        };
        let rec = block_sig::encode(&sig)?;

        let before = self.out_len;
        let written = tlv::write_record(&mut self.out, &rec).and_then(|_| self.out.sync());
        if let Err(e) = written {
            // cut a torn record so the file still ends on a boundary
            let _ = self.out.truncate(before);
            self.fail_stream(&e);
            return Err(e);
        }
        self.out_len += rec.encoded_len() as u64;

        // the signature file stays authoritative if this fails
        if let Err(e) = state_store::save(&self.state_path, &self.x_prev) {
            self.ctx.report(&self.state_path, &e);
        }

        self.blocks_finished += 1;
        info!(
            file = %self.log_path.display(),
            block = self.blocks_finished,
            records = sig.record_count,
            "block signed"
        );
        self.reset_block();
        Ok(sig)
    }

    fn discard_block(&mut self) -> Result<()> {
        if !self.block_open {
            return Ok(());
        }
        let dropped = self.records_in_block;

        if self.out_len > self.block_start_offset {
            if let Err(e) = self.out.truncate(self.block_start_offset) {
                self.fail_stream(&e);
                return Err(e);
            }
            self.out_len = self.block_start_offset;
        }
        self.x_prev = self.block_start_x_prev.clone();
        self.reset_block();

        warn!(file = %self.log_path.display(), records = dropped, "block discarded");
        Ok(())
    }
}

impl Drop for FileSigner {
    fn drop(&mut self) {
        if !self.block_open || self.records_in_block == 0 || self.disabled {
            return;
        }
        warn!(
            file = %self.log_path.display(),
            records = self.records_in_block,
            "finishing open block on drop"
        );
        if let Err(e) = self.finish_block() {
            tracing::error!(
                file = %self.log_path.display(),
                kind = e.kind().code(),
                "open block lost on drop: {}",
                e
            );
        }
    }
}

impl std::fmt::Debug for FileSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSigner")
            .field("log_path", &self.log_path)
            .field("settings", &self.settings)
            .field("disabled", &self.disabled)
            .field("block_open", &self.block_open)
            .field("records_in_block", &self.records_in_block)
            .field("blocks_finished", &self.blocks_finished)
            .finish_non_exhaustive()
    }
}
