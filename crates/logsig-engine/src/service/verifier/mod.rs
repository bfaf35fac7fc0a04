//! # Log Verifier
//!
//! Walks a log file and its signature file together, block by block.
//!
//! ## Flow
//!
//! ```text
//! header ──> get_block_params ──> block_init ──> next_record × n ──> verify_block_signature
//!                 ▲                                                          │
//!                 └──────────── chain from the block's last leaf ────────────┘
//! ```
//!
//! The first block chains from the all-zero imprint of its own hash
//! algorithm. Log records are the lines of the log file without the
//! trailing `\n`.

mod block;


pub use block::{get_block_params, BlockParams, BlockVerifier};

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::dump;
use crate::codec::tlv;
use crate::domain::config::SigningConfig;
use crate::domain::error_context::ErrorContext;
use crate::domain::errors::{ErrorKind, Result, SigError};
use crate::domain::imprint::Imprint;
use crate::ports::outbound::SignatureVerifier;

/// Verification switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Extend each signature; the result goes to the new signature file.
    pub extend: bool,
    /// Dump block parameters and full hashes.
    pub verbose: bool,
    /// Print a line for every block that verifies.
    pub show_verified: bool,
    /// Keep going after a failed block. Ignored while writing a new
    /// signature file.
    pub continue_on_error: bool,
}

/// Totals of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifySummary {
    /// Blocks that verified.
    pub blocks_verified: u64,
    /// Blocks that failed; only above 1 with `continue_on_error`.
    pub blocks_failed: u64,
    /// Log records consumed.
    pub records: u64,
    /// Last leaf of the last verified block.
    pub last_leaf: Option<Imprint>,
}

/// Verifies log files against their signature files.
pub struct LogVerifier {
    verifier: Arc<dyn SignatureVerifier>,
    options: VerifyOptions,
}

/// Next log record, without its `\n`.
fn read_log_record<L: BufRead>(log: &mut L) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    if log.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    Ok(Some(line))
}

impl LogVerifier {
    /// Verifier using `verifier` for block signatures.
    pub fn new(verifier: Arc<dyn SignatureVerifier>, options: VerifyOptions) -> Self {
        Self { verifier, options }
    }

    /// Active switches.
    pub fn options(&self) -> VerifyOptions {
        self.options
    }

    /// Verify `log_path` against `<log_path>.logsig`.
    ///
    /// See [`LogVerifier::verify_file_at`] for files signed under another
    /// suffix, e.g. with `config.sig_path(log_path)`.
    pub fn verify_file(
        &self,
        log_path: &Path,
        new_sig_path: Option<&Path>,
        ectx: &mut ErrorContext,
    ) -> Result<VerifySummary> {
        let sig_path = SigningConfig::default().sig_path(log_path);
        self.verify_file_at(log_path, &sig_path, new_sig_path, ectx)
    }

    /// Verify `log_path` against the signature file at `sig_path`.
    ///
    /// With `new_sig_path`, a rewritten signature file is produced there;
    /// it is synced only when verification succeeds.
    pub fn verify_file_at(
        &self,
        log_path: &Path,
        sig_path: &Path,
        new_sig_path: Option<&Path>,
        ectx: &mut ErrorContext,
    ) -> Result<VerifySummary> {
        let open = |path: &Path| {
            File::open(path).map_err(|e| SigError::io(e, format!("opening {}", path.display())))
        };
        let mut log = BufReader::new(open(log_path)?);
        let mut sig = BufReader::new(open(sig_path)?);
        let stdout = io::stdout();
        let mut out = stdout.lock();

        match new_sig_path {
            None => self.verify(&mut log, &mut sig, None::<&mut io::Sink>, &mut out, ectx),
            Some(path) => {
                let file = File::create(path)
                    .map_err(|e| SigError::io(e, format!("creating {}", path.display())))?;
                let mut new_sig = BufWriter::new(file);
                let summary = self.verify(&mut log, &mut sig, Some(&mut new_sig), &mut out, ectx)?;
                let file = new_sig
                    .into_inner()
                    .map_err(|e| SigError::io(e.into_error(), format!("writing {}", path.display())))?;
                file.sync_all()
                    .map_err(|e| SigError::io(e, format!("syncing {}", path.display())))?;
                Ok(summary)
            }
        }
    }

    /// Verify a log stream against a signature stream.
    ///
    /// Progress text goes to `out`; `ectx` ends up describing the first
    /// failure, which is also the error returned.
    pub fn verify<L, S, W, O>(
        &self,
        log: &mut L,
        sig: &mut S,
        mut new_sig: Option<&mut W>,
        out: &mut O,
        ectx: &mut ErrorContext,
    ) -> Result<VerifySummary>
    where
        L: BufRead,
        S: Read + Seek,
        W: Write,
        O: Write,
    {
        ectx.verbose = self.options.verbose;
        let continue_on_error = self.options.continue_on_error && new_sig.is_none();

        if let Err(e) = tlv::check_file_header(sig) {
            ectx.fail(e.kind());
            return Err(e);
        }
        if let Some(w) = new_sig.as_deref_mut() {
            tlv::write_file_header(w)?;
        }

        let mut summary = VerifySummary::default();
        let mut first_failure: Option<(SigError, ErrorContext)> = None;
        let mut x_prev: Option<Imprint> = None;
        let mut blk_num = 0u64;

        loop {
            let params = match get_block_params(sig) {
                Ok(params) => params,
                Err(e) if e.kind() == ErrorKind::Eof => {
                    if !log.fill_buf()?.is_empty() {
                        let e = SigError::with_detail(
                            ErrorKind::EndOfSig,
                            "log has records after the last signed block",
                        );
                        ectx.rec_num_in_file += 1;
                        ectx.err_rec = None;
                        ectx.fail(e.kind());
                        first_failure.get_or_insert((e, ectx.clone()));
                    }
                    break;
                }
                Err(e) => {
                    ectx.start_block(blk_num + 1);
                    ectx.fail(e.kind());
                    summary.blocks_failed += 1;
                    first_failure.get_or_insert((e, ectx.clone()));
                    break;
                }
            };

            blk_num += 1;
            ectx.start_block(blk_num);
            if self.options.verbose {
                writeln!(out, "Block {}:", blk_num)?;
                out.write_all(dump::render_block_sig(&params.block_sig, true).as_bytes())?;
            }

            let chain = x_prev
                .take()
                .unwrap_or_else(|| Imprint::zero(params.block_sig.hash_algorithm));
            let mut bv = BlockVerifier::block_init(self.verifier.as_ref(), params.clone(), chain);
            match self.verify_block(log, sig, new_sig.as_deref_mut(), &mut bv, ectx) {
                Ok(()) => {
                    summary.blocks_verified += 1;
                    summary.records += bv.records();
                    summary.last_leaf = Some(bv.last_leaf().clone());
                    x_prev = Some(bv.last_leaf().clone());
                    if self.options.show_verified {
                        writeln!(out, "block {} verified: {} records", blk_num, bv.records())?;
                    }
                }
                Err(e) => {
                    if ectx.is_clear() {
                        ectx.fail(e.kind());
                    }
                    summary.blocks_failed += 1;
                    summary.records += bv.records();
                    error!(file = %ectx.filename, block = blk_num, kind = e.kind().code(), "{}", e);
                    first_failure.get_or_insert((e, ectx.clone()));
                    if !continue_on_error {
                        break;
                    }

                    // resync on the next block
                    let remaining = params.block_sig.record_count.saturating_sub(ectx.rec_num);
                    let mut log_done = false;
                    for _ in 0..remaining {
                        if read_log_record(log)?.is_none() {
                            log_done = true;
                            break;
                        }
                        ectx.rec_num_in_file += 1;
                    }
                    if log_done {
                        break;
                    }
                    sig.seek(SeekFrom::Start(params.end_offset))?;
                    x_prev = Some(params.block_sig.last_hash.clone());
                    ectx.error = None;
                    warn!(file = %ectx.filename, block = blk_num, "continuing after failed block");
                }
            }
        }

        info!(
            file = %ectx.filename,
            verified = summary.blocks_verified,
            failed = summary.blocks_failed,
            records = summary.records,
            "verification finished"
        );

        match first_failure {
            Some((e, snapshot)) => {
                *ectx = snapshot;
                Err(e)
            }
            None => Ok(summary),
        }
    }

    fn verify_block<L, S, W>(
        &self,
        log: &mut L,
        sig: &mut S,
        mut new_sig: Option<&mut W>,
        bv: &mut BlockVerifier<'_>,
        ectx: &mut ErrorContext,
    ) -> Result<()>
    where
        L: BufRead,
        S: Read,
        W: Write,
    {
        let count = bv.params().block_sig.record_count;
        for _ in 0..count {
            let Some(record) = read_log_record(log)? else {
                ectx.fail(ErrorKind::EndOfLog);
                return Err(SigError::with_detail(
                    ErrorKind::EndOfLog,
                    format!("log ended inside block {}", ectx.blk_num),
                ));
            };
            ectx.next_record(&record);
            bv.next_record(sig, &record, new_sig.as_deref_mut(), ectx)?;
        }
        bv.verify_block_signature(sig, self.options.extend, new_sig, ectx)?;
        Ok(())
    }
}

impl std::fmt::Debug for LogVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogVerifier")
            .field("scheme", &self.verifier.scheme())
            .field("options", &self.options)
            .finish()
    }
}
