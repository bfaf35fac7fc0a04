//! # State File Format
//!
//! ```text
//! [magic: 9 bytes "KSISTAT10"] [hash id: 1] [hash len: 1] [digest: hash len]
//! ```
//!
//! Holds the last leaf of the most recently finished block.

use shared_crypto::HashAlgorithm;

use crate::domain::errors::{ErrorKind, Result, SigError};
use crate::domain::imprint::Imprint;

/// Magic literal opening every state file.
pub const STATE_FILE_MAGIC: &[u8; 9] = b"KSISTAT10";

/// Serialize the chain state.
pub fn encode(last_leaf: &Imprint) -> Vec<u8> {
    let mut out = Vec::with_capacity(STATE_FILE_MAGIC.len() + 2 + last_leaf.len());
    out.extend_from_slice(STATE_FILE_MAGIC);
    out.push(last_leaf.hash_id());
    // digest lengths top out at 64
    out.push(last_leaf.len() as u8);
    out.extend_from_slice(last_leaf.digest());
    out
}

/// Parse the chain state.
///
/// # Errors
///
/// - `InvalidHeader` on a wrong or short magic
/// - `Length` when the stored length disagrees with the algorithm or the bytes present
/// - `Format` on an unknown hash id
pub fn decode(bytes: &[u8]) -> Result<Imprint> {
    let body = bytes
        .strip_prefix(STATE_FILE_MAGIC.as_slice())
        .ok_or_else(|| SigError::with_detail(ErrorKind::InvalidHeader, "state file magic"))?;

    let [hash_id, hash_len, digest @ ..] = body else {
        return Err(SigError::with_detail(ErrorKind::Length, "state file too short"));
    };
    let algorithm = HashAlgorithm::from_id(*hash_id)
        .map_err(|e| SigError::with_detail(ErrorKind::Format, e.to_string()))?;
    if digest.len() != *hash_len as usize {
        return Err(SigError::with_detail(
            ErrorKind::Length,
            format!("state file announces {} bytes, holds {}", hash_len, digest.len()),
        ));
    }
    Imprint::new(algorithm, digest.to_vec())
}
