//! # Block Signature Encoding
//!
//! A block signature is a `0x0904` record whose payload is a run of child
//! TLVs:
//!
//! | Type | Content |
//! |------|---------|
//! | 0x01 | hash algorithm id (1 byte) |
//! | 0x02 | blinding-mask IV |
//! | 0x03 | last leaf imprint |
//! | 0x04 | record count, big-endian, minimal length |
//! | 0x0905 / 0x0906 / 0x0907 | signature blob (KSI / RFC 3161 / Ed25519) |

use shared_crypto::HashAlgorithm;

use super::tlv::{read_all, TlvRecord};
use super::types;
use crate::domain::block_sig::{BlockSignature, SignatureScheme};
use crate::domain::errors::{ErrorKind, Result, SigError};
use crate::domain::imprint::Imprint;

/// TLV type carrying a blob of the given scheme.
pub fn scheme_tlv_type(scheme: SignatureScheme) -> u16 {
    match scheme {
        SignatureScheme::Ksi => types::KSI_SIGNATURE,
        SignatureScheme::Rfc3161 => types::RFC3161_TIMESTAMP,
        SignatureScheme::Ed25519 => types::ED25519_SIGNATURE,
    }
}

/// Scheme for a signature TLV type.
pub fn scheme_from_tlv_type(tlv_type: u16) -> Option<SignatureScheme> {
    match tlv_type {
        types::KSI_SIGNATURE => Some(SignatureScheme::Ksi),
        types::RFC3161_TIMESTAMP => Some(SignatureScheme::Rfc3161),
        types::ED25519_SIGNATURE => Some(SignatureScheme::Ed25519),
        _ => None,
    }
}

fn encode_count(count: u64) -> Vec<u8> {
    let bytes = count.to_be_bytes();
    let skip = bytes.iter().take(7).take_while(|b| **b == 0).count();
    bytes[skip..].to_vec()
}

fn decode_count(bytes: &[u8]) -> Result<u64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(SigError::with_detail(
            ErrorKind::Length,
            format!("record count of {} bytes", bytes.len()),
        ));
    }
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
}

/// Frame a block signature as a `0x0904` record.
pub fn encode(sig: &BlockSignature) -> Result<TlvRecord> {
    let children = [
        TlvRecord::new(types::BSIG_HASH_ID, vec![sig.hash_algorithm.id()])?,
        TlvRecord::new(types::BSIG_IV, sig.iv.clone())?,
        TlvRecord::new(types::BSIG_LAST_HASH, sig.last_hash.to_bytes())?,
        TlvRecord::new(types::BSIG_RECORD_COUNT, encode_count(sig.record_count))?,
        TlvRecord::new(scheme_tlv_type(sig.scheme), sig.signature.clone())?,
    ];
    let payload: Vec<u8> = children.iter().flat_map(TlvRecord::to_bytes).collect();
    TlvRecord::new(types::BLOCK_SIG, payload)
}

fn missing(field: &str) -> SigError {
    SigError::with_detail(
        ErrorKind::Format,
        format!("block signature without {}", field),
    )
}

/// Parse a `0x0904` record.
///
/// # Errors
///
/// - `InvalidType` if `rec` is not a block signature or holds an unknown critical child
/// - `Format` if a mandatory child is missing or malformed
pub fn decode(rec: &TlvRecord) -> Result<BlockSignature> {
    if rec.tlv_type() != types::BLOCK_SIG {
        return Err(SigError::with_detail(
            ErrorKind::InvalidType,
            format!("expected block signature, got 0x{:04x}", rec.tlv_type()),
        ));
    }

    let mut hash_id = None;
    let mut iv = None;
    let mut last_hash = None;
    let mut record_count = None;
    let mut signature = None;

    for child in read_all(rec.payload())? {
        match child.tlv_type() {
            types::BSIG_HASH_ID => match child.payload() {
                [id] => hash_id = Some(*id),
                other => {
                    return Err(SigError::with_detail(
                        ErrorKind::Length,
                        format!("hash id of {} bytes", other.len()),
                    ))
                }
            },
            types::BSIG_IV => iv = Some(child.into_payload()),
            types::BSIG_LAST_HASH => last_hash = Some(Imprint::from_bytes(child.payload())?),
            types::BSIG_RECORD_COUNT => record_count = Some(decode_count(child.payload())?),
            t => match scheme_from_tlv_type(t) {
                Some(scheme) => signature = Some((scheme, child.into_payload())),
                None => {
                    child.skip_unknown()?;
                }
            },
        }
    }

    let hash_id = hash_id.ok_or_else(|| missing("hash id"))?;
    let hash_algorithm = HashAlgorithm::from_id(hash_id)
        .map_err(|e| SigError::with_detail(ErrorKind::Format, e.to_string()))?;
    let iv = iv.ok_or_else(|| missing("IV"))?;
    let last_hash = last_hash.ok_or_else(|| missing("last hash"))?;
    let record_count = record_count.ok_or_else(|| missing("record count"))?;
    let (scheme, signature) = signature.ok_or_else(|| missing("signature"))?;

    if iv.len() != hash_algorithm.digest_len() {
        return Err(SigError::with_detail(
            ErrorKind::Length,
            format!("IV of {} bytes for {}", iv.len(), hash_algorithm),
        ));
    }

    Ok(BlockSignature {
        hash_algorithm,
        scheme,
        iv,
        last_hash,
        record_count,
        signature,
    })
}
