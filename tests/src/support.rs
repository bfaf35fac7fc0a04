//! # Test Fixtures
//!
//! Signed logs on disk plus a from-scratch recomputation of block roots
//! that shares no code with the engine's forest.

use std::fs::{self, OpenOptions};
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::Arc;

use logsig_engine::codec::{block_sig, tlv, types};
use logsig_engine::{
    BlockSignature, BlockSigningApi, Ed25519BlockSigner, ErrorContext, FileSigner, IvSource,
    LogVerifier, Result, SigningConfig, SigningContext, VerifyOptions, VerifySummary,
};
use shared_crypto::HashAlgorithm;
use tracing_subscriber::EnvFilter;

/// Seed of the test signing key.
pub const KEY_SEED: [u8; 32] = [0x42; 32];

/// Byte every test IV is filled with.
pub const IV_BYTE: u8 = 0x5a;

/// Route engine logs to the test writer; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Deterministic IVs so roots can be recomputed.
pub struct FixedIv;

impl IvSource for FixedIv {
    fn fill_iv(&self, iv: &mut [u8]) -> Result<()> {
        iv.fill(IV_BYTE);
        Ok(())
    }
}

/// Signer for [`KEY_SEED`].
pub fn block_signer() -> Ed25519BlockSigner {
    Ed25519BlockSigner::from_seed(KEY_SEED)
}

// =============================================================================
// SIGNED LOG FIXTURE
// =============================================================================

/// A log file and its signature file in a temp directory.
pub struct SignedLog {
    dir: tempfile::TempDir,
    ctx: Arc<SigningContext>,
}

impl SignedLog {
    /// Empty fixture signing under `config`.
    pub fn new(config: SigningConfig) -> Self {
        init_tracing();
        let ctx = SigningContext::new(config, Arc::new(block_signer()))
            .expect("valid config")
            .with_iv_source(Arc::new(FixedIv));
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
            ctx: Arc::new(ctx),
        }
    }

    /// Shared context.
    pub fn ctx(&self) -> &Arc<SigningContext> {
        &self.ctx
    }

    /// Path of the log file.
    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("app.log")
    }

    /// Path of the signature file.
    pub fn sig_path(&self) -> PathBuf {
        self.dir.path().join("app.log.logsig")
    }

    /// Path of the state file.
    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("app.log.logstate")
    }

    /// Open the log for signing.
    pub fn open(&self) -> FileSigner {
        self.ctx.open_file(&self.log_path()).expect("open for signing")
    }

    /// Write `line` to the log and hash it.
    pub fn append(&self, file: &mut FileSigner, line: &str) {
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())
            .expect("open log");
        writeln!(log, "{}", line).expect("write log");
        file.add_record(line.as_bytes()).expect("add record");
    }

    /// Sign each group as one block, then close.
    pub fn sign_blocks(&self, blocks: &[Vec<String>]) -> Vec<BlockSignature> {
        let mut file = self.open();
        let mut sigs = Vec::new();
        for block in blocks {
            for line in block {
                self.append(&mut file, line);
            }
            sigs.push(file.finish_block().expect("finish block"));
        }
        file.close().expect("close");
        sigs
    }

    /// Log file contents.
    pub fn log_bytes(&self) -> Vec<u8> {
        fs::read(self.log_path()).unwrap_or_default()
    }

    /// Signature file contents.
    pub fn sig_bytes(&self) -> Vec<u8> {
        fs::read(self.sig_path()).expect("read signature file")
    }

    /// Replace line `index` (0-based) of the log.
    pub fn rewrite_line(&self, index: usize, replacement: &str) {
        let text = String::from_utf8(self.log_bytes()).expect("utf-8 log");
        let mut lines: Vec<&str> = text.lines().collect();
        lines[index] = replacement;
        let mut out = lines.join("\n");
        out.push('\n');
        fs::write(self.log_path(), out).expect("rewrite log");
    }

    /// Verify in memory with `options`.
    pub fn verify_with(&self, options: VerifyOptions) -> (Result<VerifySummary>, ErrorContext, String) {
        verify_bytes(&self.log_bytes(), &self.sig_bytes(), options)
    }

    /// Verify the files on disk with default options.
    pub fn verify(&self) -> (Result<VerifySummary>, ErrorContext) {
        let verifier = LogVerifier::new(Arc::new(block_signer().verifier()), VerifyOptions::default());
        let mut ectx = ErrorContext::new(self.log_path().display().to_string());
        let result = verifier.verify_file(&self.log_path(), None, &mut ectx);
        (result, ectx)
    }

    /// Block-signature records in file order.
    pub fn block_sigs(&self) -> Vec<BlockSignature> {
        let bytes = self.sig_bytes();
        let mut slice = &bytes[..];
        tlv::check_file_header(&mut slice).expect("signature file header");
        tlv::read_all(slice)
            .expect("well-formed signature file")
            .iter()
            .filter(|rec| rec.tlv_type() == types::BLOCK_SIG)
            .map(|rec| block_sig::decode(rec).expect("block signature"))
            .collect()
    }
}

/// Verify in-memory log and signature bytes with the test key.
pub fn verify_bytes(
    log: &[u8],
    sig: &[u8],
    options: VerifyOptions,
) -> (Result<VerifySummary>, ErrorContext, String) {
    let verifier = LogVerifier::new(Arc::new(block_signer().verifier()), options);
    let mut ectx = ErrorContext::new("app.log");
    let mut out = Vec::new();
    let result = verifier.verify(
        &mut &log[..],
        &mut Cursor::new(sig),
        None::<&mut Vec<u8>>,
        &mut out,
        &mut ectx,
    );
    (result, ectx, String::from_utf8_lossy(&out).into_owned())
}

/// `count` distinct lines starting at `from`.
pub fn lines(from: usize, count: usize) -> Vec<String> {
    (from..from + count).map(|i| format!("record {:04}", i)).collect()
}

// =============================================================================
// INDEPENDENT RECOMPUTATION
// =============================================================================

fn imprint(alg: HashAlgorithm, digest: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(digest.len() + 1);
    out.push(alg.id());
    out.extend_from_slice(digest);
    out
}

fn h(alg: HashAlgorithm, parts: &[&[u8]]) -> Vec<u8> {
    imprint(alg, &alg.hash_many(parts).expect("supported algorithm"))
}

fn node(alg: HashAlgorithm, left: &[u8], right: &[u8], level: u8) -> Vec<u8> {
    h(alg, &[&[level], left, right])
}

/// Roots and last leaves of consecutive blocks, recomputed from the raw
/// records with a stack of perfect subtrees.
///
/// Returns `(root, last_leaf)` imprint bytes per block.
pub fn expected_blocks(alg: HashAlgorithm, blocks: &[Vec<String>]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let iv = vec![IV_BYTE; alg.digest_len()];
    let mut x_prev = imprint(alg, &vec![0u8; alg.digest_len()]);
    let mut out = Vec::new();

    for block in blocks {
        // (height, hash); heights strictly decrease from bottom to top
        let mut stack: Vec<(u8, Vec<u8>)> = Vec::new();
        for line in block {
            let mask = h(alg, &[&x_prev, &iv]);
            let rec = h(alg, &[line.as_bytes()]);
            let leaf = node(alg, &mask, &rec, 1);
            x_prev = leaf.clone();

            stack.push((1, leaf));
            while stack.len() >= 2 && stack[stack.len() - 1].0 == stack[stack.len() - 2].0 {
                let (height, right) = stack.pop().expect("two entries");
                let (_, left) = stack.pop().expect("two entries");
                stack.push((height + 1, node(alg, &left, &right, height + 1)));
            }
        }

        let (_, mut root) = stack.pop().expect("non-empty block");
        while let Some((height, left)) = stack.pop() {
            root = node(alg, &left, &root, height + 1);
        }
        out.push((root, x_prev.clone()));
    }
    out
}
