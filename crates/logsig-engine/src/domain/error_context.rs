//! # Error Context
//!
//! Position and hash provenance accumulated while verifying, so a failure
//! can be reported without re-deriving where it happened.

use std::fmt::Write as _;

use super::errors::ErrorKind;
use super::imprint::Imprint;

/// Mutable diagnostics passed into verification.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Log file being verified.
    pub filename: String,
    /// Print extra detail when reporting.
    pub verbose: bool,
    /// 1-based record number within the log file.
    pub rec_num_in_file: u64,
    /// 1-based record number within the current block.
    pub rec_num: u64,
    /// 1-based block number.
    pub blk_num: u64,
    /// Tree level of the failing hash; 0 for the last-leaf check.
    pub tree_level: u8,
    /// Hash the verifier computed.
    pub computed_hash: Option<Imprint>,
    /// Left input of the failing node.
    pub left_hash: Option<Imprint>,
    /// Right input of the failing node.
    pub right_hash: Option<Imprint>,
    /// Hash read from the signature file.
    pub file_hash: Option<Imprint>,
    /// Text of the record being verified.
    pub err_rec: Option<String>,
    /// Text of the first record of the current block.
    pub first_rec_in_blk: Option<String>,
    /// Kind of the recorded failure.
    pub error: Option<ErrorKind>,
}

fn as_text(record: &[u8]) -> String {
    String::from_utf8_lossy(record).into_owned()
}

impl ErrorContext {
    /// Fresh context for a log file.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    /// Remember the record being verified.
    pub fn set_err_rec(&mut self, record: &[u8]) {
        self.err_rec = Some(as_text(record));
    }

    /// Remember the first record of the block.
    pub fn set_first_rec_in_blk(&mut self, record: &[u8]) {
        self.first_rec_in_blk = Some(as_text(record));
    }

    /// Enter a new block.
    pub fn start_block(&mut self, blk_num: u64) {
        self.blk_num = blk_num;
        self.rec_num = 0;
        self.first_rec_in_blk = None;
        self.clear_hashes();
    }

    /// Advance to the next record; `record` is its text.
    pub fn next_record(&mut self, record: &[u8]) {
        self.rec_num_in_file += 1;
        self.rec_num += 1;
        if self.rec_num == 1 {
            self.set_first_rec_in_blk(record);
        }
        self.set_err_rec(record);
    }

    /// Store the two hashes of a comparison.
    pub fn set_hashes(&mut self, computed: &Imprint, from_file: &Imprint, tree_level: u8) {
        self.computed_hash = Some(computed.clone());
        self.file_hash = Some(from_file.clone());
        self.tree_level = tree_level;
    }

    /// Store the inputs of a node hash.
    pub fn set_children(&mut self, left: &Imprint, right: &Imprint) {
        self.left_hash = Some(left.clone());
        self.right_hash = Some(right.clone());
    }

    fn clear_hashes(&mut self) {
        self.computed_hash = None;
        self.left_hash = None;
        self.right_hash = None;
        self.file_hash = None;
        self.tree_level = 0;
    }

    /// Record the failure kind.
    pub fn fail(&mut self, kind: ErrorKind) {
        self.error = Some(kind);
    }

    /// True when no failure has been recorded.
    pub fn is_clear(&self) -> bool {
        self.error.is_none()
    }

    /// Multi-line report of the recorded failure.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let Some(kind) = self.error else {
            let _ = writeln!(out, "{}: no error", self.filename);
            return out;
        };
        let _ = writeln!(
            out,
            "{}[{}]: error[{}]: {}",
            self.filename,
            self.rec_num_in_file,
            kind.code(),
            kind
        );
        let _ = writeln!(out, "\tBlock: {}", self.blk_num);
        let _ = writeln!(out, "\tRecord Number: {}", self.rec_num_in_file);
        let _ = writeln!(out, "\tRecord Number in Block: {}", self.rec_num);
        if let Some(first) = &self.first_rec_in_blk {
            if self.verbose {
                let _ = writeln!(out, "\tFirst Record in Block: '{}'", first);
            }
        }
        if let Some(rec) = &self.err_rec {
            let _ = writeln!(out, "\tRecord: '{}'", rec);
        }
        if self.computed_hash.is_some() || self.file_hash.is_some() {
            let _ = writeln!(out, "\tTree Level: {}", self.tree_level);
        }
        if let Some(hash) = &self.file_hash {
            let _ = writeln!(out, "\tSignature File Hash...: {}", hash);
        }
        if let Some(hash) = &self.computed_hash {
            let _ = writeln!(out, "\tComputed Hash........: {}", hash);
        }
        if self.verbose {
            if let Some(hash) = &self.left_hash {
                let _ = writeln!(out, "\tTree Left Hash.......: {}", hash);
            }
            if let Some(hash) = &self.right_hash {
                let _ = writeln!(out, "\tTree Right Hash......: {}", hash);
            }
        }
        out
    }
}
