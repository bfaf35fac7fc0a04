//! # Block Verification
//!
//! Replays one block: recomputes every mask, record hash, leaf and node,
//! compares them with whatever the block retained, then checks the
//! block-signature record and its signature.

use std::io::{Read, Seek, SeekFrom, Write};

use shared_crypto::HashAlgorithm;
use tracing::debug;

use crate::codec::tlv::{self, TlvRecord};
use crate::codec::{block_sig, types};
use crate::domain::block_sig::BlockSignature;
use crate::domain::error_context::ErrorContext;
use crate::domain::errors::{ErrorKind, Result, SigError};
use crate::domain::forest::MerkleForest;
use crate::domain::hashing::{hash_m, masked_leaf, record_hash, LEAF_LEVEL};
use crate::domain::imprint::{Imprint, ImprintMismatch};
use crate::ports::outbound::SignatureVerifier;

// =============================================================================
// BLOCK PARAMETERS
// =============================================================================

/// What lies between the current position and the next block signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockParams {
    /// Parsed block-signature record.
    pub block_sig: BlockSignature,
    /// The block retains record hashes.
    pub has_record_hashes: bool,
    /// The block retains tree hashes.
    pub has_tree_hashes: bool,
    /// Record-hash TLVs found.
    pub record_hashes: u64,
    /// Offset of the block's first TLV.
    pub start_offset: u64,
    /// Offset just past the block-signature record.
    pub end_offset: u64,
}

/// Look ahead to the next block signature, then seek back.
///
/// # Errors
///
/// - `Eof` if the stream ends before any TLV
/// - `MissingBlockSig` if TLVs are found but no block signature follows
/// - `InvalidRecordCount` if retained record hashes disagree with the record count
/// - `EndOfSig` on a truncated record
pub fn get_block_params<R: Read + Seek>(sig: &mut R) -> Result<BlockParams> {
    let start_offset = sig.stream_position()?;
    let mut has_record_hashes = false;
    let mut has_tree_hashes = false;
    let mut record_hashes = 0u64;
    let mut seen = 0u64;

    let block_sig = loop {
        let rec = match tlv::read_record(sig) {
            Ok(rec) => rec,
            Err(e) if e.kind() == ErrorKind::Eof => {
                return Err(if seen == 0 {
                    e
                } else {
                    SigError::with_detail(
                        ErrorKind::MissingBlockSig,
                        format!("{} records without a block signature", seen),
                    )
                });
            }
            Err(e) => return Err(e),
        };
        seen += 1;
        match rec.tlv_type() {
            types::RECORD_HASH => {
                has_record_hashes = true;
                record_hashes += 1;
            }
            types::TREE_HASH => has_tree_hashes = true,
            types::BLOCK_SIG => break block_sig::decode(&rec)?,
            _ => {
                rec.skip_unknown()?;
            }
        }
    };

    let end_offset = sig.stream_position()?;
    sig.seek(SeekFrom::Start(start_offset))?;

    if has_record_hashes && record_hashes != block_sig.record_count {
        return Err(SigError::with_detail(
            ErrorKind::InvalidRecordCount,
            format!(
                "{} record hashes, block signature says {}",
                record_hashes, block_sig.record_count
            ),
        ));
    }

    Ok(BlockParams {
        block_sig,
        has_record_hashes,
        has_tree_hashes,
        record_hashes,
        start_offset,
        end_offset,
    })
}

// =============================================================================
// BLOCK VERIFIER
// =============================================================================

/// Verification state of one block.
pub struct BlockVerifier<'v> {
    verifier: &'v dyn SignatureVerifier,
    params: BlockParams,
    algorithm: HashAlgorithm,
    x_prev: Imprint,
    forest: MerkleForest,
    records: u64,
}

fn mismatch(
    ectx: &mut ErrorContext,
    computed: &Imprint,
    from_file: &Imprint,
    level: u8,
    how: ImprintMismatch,
    id_kind: ErrorKind,
    digest_kind: ErrorKind,
) -> SigError {
    ectx.set_hashes(computed, from_file, level);
    let kind = match how {
        ImprintMismatch::HashId => id_kind,
        ImprintMismatch::Digest => digest_kind,
    };
    ectx.fail(kind);
    SigError::with_detail(kind, format!("record {} of block {}", ectx.rec_num, ectx.blk_num))
}

fn copy_to<W: Write>(new_sig: Option<&mut W>, rec: &TlvRecord) -> Result<()> {
    match new_sig {
        Some(w) => tlv::write_record(w, rec),
        None => Ok(()),
    }
}

impl<'v> BlockVerifier<'v> {
    /// Start a block chained from `x_prev`.
    pub fn block_init(verifier: &'v dyn SignatureVerifier, params: BlockParams, x_prev: Imprint) -> Self {
        let algorithm = params.block_sig.hash_algorithm;
        Self {
            verifier,
            params,
            algorithm,
            x_prev,
            forest: MerkleForest::new(algorithm),
            records: 0,
        }
    }

    /// Parameters of the block.
    pub fn params(&self) -> &BlockParams {
        &self.params
    }

    /// Last leaf recomputed so far.
    pub fn last_leaf(&self) -> &Imprint {
        &self.x_prev
    }

    /// Records consumed so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Next hash-bearing TLV; unknown non-critical ones are skipped, and
    /// copied through when marked forward.
    fn next_tlv<R: Read, W: Write>(sig: &mut R, mut new_sig: Option<&mut W>) -> Result<TlvRecord> {
        loop {
            let rec = tlv::read_record(sig)?;
            match rec.tlv_type() {
                types::RECORD_HASH | types::TREE_HASH | types::BLOCK_SIG => return Ok(rec),
                _ => {
                    rec.skip_unknown()?;
                    if rec.is_forward() {
                        copy_to(new_sig.as_deref_mut(), &rec)?;
                    }
                }
            }
        }
    }

    /// Next retained hash of `tlv_type`, checked to carry the same hash id
    /// as `computed` before its digest is parsed.
    #[allow(clippy::too_many_arguments)]
    fn expect_hash<R: Read, W: Write>(
        sig: &mut R,
        new_sig: Option<&mut W>,
        tlv_type: u16,
        missing: ErrorKind,
        id_kind: ErrorKind,
        computed: &Imprint,
        level: u8,
        ectx: &mut ErrorContext,
    ) -> Result<(TlvRecord, Imprint)> {
        let rec = match Self::next_tlv(sig, new_sig) {
            Ok(rec) if rec.tlv_type() == tlv_type => rec,
            Ok(_) => {
                ectx.fail(missing);
                return Err(SigError::new(missing));
            }
            Err(e) if e.kind() == ErrorKind::Eof => {
                ectx.fail(missing);
                return Err(SigError::new(missing));
            }
            Err(e) => return Err(e),
        };
        if let Some(&id) = rec.payload().first() {
            if id != computed.hash_id() {
                ectx.computed_hash = Some(computed.clone());
                ectx.file_hash = None;
                ectx.tree_level = level;
                ectx.fail(id_kind);
                return Err(SigError::with_detail(
                    id_kind,
                    format!(
                        "hash id 0x{:02x} in file, expected 0x{:02x} at record {} of block {}",
                        id,
                        computed.hash_id(),
                        ectx.rec_num,
                        ectx.blk_num
                    ),
                ));
            }
        }
        let imprint = Imprint::from_bytes(rec.payload())?;
        Ok((rec, imprint))
    }

    /// Hash one log record and check it against the retained hashes.
    pub fn next_record<R: Read, W: Write>(
        &mut self,
        sig: &mut R,
        record: &[u8],
        mut new_sig: Option<&mut W>,
        ectx: &mut ErrorContext,
    ) -> Result<()> {
        let alg = self.algorithm;
        let mask = hash_m(alg, &self.x_prev, &self.params.block_sig.iv)?;
        let rec_hash = record_hash(alg, record)?;

        if self.params.has_record_hashes {
            let (rec, stored) = Self::expect_hash(
                sig,
                new_sig.as_deref_mut(),
                types::RECORD_HASH,
                ErrorKind::MissingRecordHash,
                ErrorKind::RecordHashIdMismatch,
                &rec_hash,
                0,
                ectx,
            )?;
            if let Err(how) = rec_hash.check_against(&stored) {
                return Err(mismatch(
                    ectx,
                    &rec_hash,
                    &stored,
                    0,
                    how,
                    ErrorKind::RecordHashIdMismatch,
                    ErrorKind::RecordHashMismatch,
                ));
            }
            copy_to(new_sig.as_deref_mut(), &rec)?;
        }

        let leaf = masked_leaf(alg, &mask, &rec_hash)?;
        let nodes = self.forest.push(leaf.clone())?;

        if self.params.has_tree_hashes {
            ectx.set_children(&mask, &rec_hash);
            let computed = std::iter::once((LEAF_LEVEL, &leaf))
                .chain(nodes.iter().map(|n| (n.level, &n.hash)));
            for (level, hash) in computed {
                let (rec, stored) = Self::expect_hash(
                    sig,
                    new_sig.as_deref_mut(),
                    types::TREE_HASH,
                    ErrorKind::MissingTreeHash,
                    ErrorKind::TreeHashIdMismatch,
                    hash,
                    level,
                    ectx,
                )?;
                if let Err(how) = hash.check_against(&stored) {
                    return Err(mismatch(
                        ectx,
                        hash,
                        &stored,
                        level,
                        how,
                        ErrorKind::TreeHashIdMismatch,
                        ErrorKind::TreeHashMismatch,
                    ));
                }
                copy_to(new_sig.as_deref_mut(), &rec)?;
            }
        }

        self.x_prev = leaf;
        self.records += 1;
        Ok(())
    }

    /// Read the block-signature record and check count, last leaf and signature.
    ///
    /// With `extend`, the blob written to `new_sig` is the extended one.
    pub fn verify_block_signature<R: Read, W: Write>(
        &mut self,
        sig: &mut R,
        extend: bool,
        mut new_sig: Option<&mut W>,
        ectx: &mut ErrorContext,
    ) -> Result<BlockSignature> {
        let rec = match Self::next_tlv(sig, new_sig.as_deref_mut()) {
            Ok(rec) if rec.tlv_type() == types::BLOCK_SIG => rec,
            Ok(_) => {
                ectx.fail(ErrorKind::InvalidRecordCount);
                return Err(SigError::with_detail(
                    ErrorKind::InvalidRecordCount,
                    "more hashes than records before block signature",
                ));
            }
            Err(e) if e.kind() == ErrorKind::Eof => {
                ectx.fail(ErrorKind::MissingBlockSig);
                return Err(SigError::new(ErrorKind::MissingBlockSig));
            }
            Err(e) => return Err(e),
        };
        let bs = block_sig::decode(&rec)?;

        if self.records != bs.record_count {
            ectx.fail(ErrorKind::InvalidRecordCount);
            return Err(SigError::with_detail(
                ErrorKind::InvalidRecordCount,
                format!("hashed {}, block signature says {}", self.records, bs.record_count),
            ));
        }

        if let Err(how) = self.x_prev.check_against(&bs.last_hash) {
            return Err(mismatch(
                ectx,
                &self.x_prev.clone(),
                &bs.last_hash,
                0,
                how,
                ErrorKind::TreeHashIdMismatch,
                ErrorKind::TreeHashMismatch,
            ));
        }

        let root = self.forest.root()?;
        if bs.scheme != self.verifier.scheme() {
            ectx.fail(ErrorKind::InvalidSignature);
            return Err(SigError::with_detail(
                ErrorKind::InvalidSignature,
                format!("no verifier for {} signatures", bs.scheme),
            ));
        }
        if let Err(e) = self.verifier.verify(&root, &bs.signature) {
            ectx.fail(ErrorKind::InvalidSignature);
            return Err(SigError::with_detail(ErrorKind::InvalidSignature, e.to_string()));
        }

        match new_sig {
            Some(w) if extend => {
                let blob = self.verifier.extend(&bs.signature).map_err(|e| {
                    ectx.fail(ErrorKind::SigExtend);
                    SigError::with_detail(ErrorKind::SigExtend, e.to_string())
                })?;
                let extended = BlockSignature {
                    signature: blob,
                    ..bs.clone()
                };
                tlv::write_record(w, &block_sig::encode(&extended)?)?;
            }
            Some(w) => tlv::write_record(w, &rec)?,
            None => {}
        }

        debug!(block = ectx.blk_num, records = self.records, "block signature verified");
        Ok(bs)
    }
}
