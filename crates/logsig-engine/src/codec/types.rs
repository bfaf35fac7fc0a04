//! TLV type registry.

/// Retained record hash (payload: imprint).
pub const RECORD_HASH: u16 = 0x0902;
/// Retained tree hash (payload: imprint).
pub const TREE_HASH: u16 = 0x0903;
/// Block signature (payload: child TLVs).
pub const BLOCK_SIG: u16 = 0x0904;

/// Block-signature child: hash algorithm id.
pub const BSIG_HASH_ID: u16 = 0x01;
/// Block-signature child: blinding-mask IV.
pub const BSIG_IV: u16 = 0x02;
/// Block-signature child: last leaf imprint.
pub const BSIG_LAST_HASH: u16 = 0x03;
/// Block-signature child: record count.
pub const BSIG_RECORD_COUNT: u16 = 0x04;

/// Signature blob: KSI signature.
pub const KSI_SIGNATURE: u16 = 0x0905;
/// Signature blob: RFC 3161 timestamp.
pub const RFC3161_TIMESTAMP: u16 = 0x0906;
/// Signature blob: Ed25519 signature.
pub const ED25519_SIGNATURE: u16 = 0x0907;

/// Human-readable name of a top-level type.
pub fn name(tlv_type: u16) -> &'static str {
    match tlv_type {
        RECORD_HASH => "Record Hash",
        TREE_HASH => "Tree Hash",
        BLOCK_SIG => "Block Signature Record",
        KSI_SIGNATURE => "KSI Signature",
        RFC3161_TIMESTAMP => "RFC3161 Timestamp",
        ED25519_SIGNATURE => "Ed25519 Signature",
        _ => "unknown",
    }
}
