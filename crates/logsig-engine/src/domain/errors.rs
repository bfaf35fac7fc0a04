//! # Domain Errors
//!
//! Flat error taxonomy for signing and verification.
//!
//! ## Design Principles
//!
//! - Every failure is one [`ErrorKind`] with a stable numeric code
//! - Each kind renders through a fixed message table, never an ad hoc string
//! - Optional detail and I/O source travel alongside the kind

use std::fmt;
use std::io;

use shared_crypto::CryptoError;
use thiserror::Error;

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, SigError>;

/// Error kinds, numbered 1..=22.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Underlying read/write failure.
    Io,
    /// Payload bytes do not parse.
    Format,
    /// Unknown critical TLV or TLV where another was expected.
    InvalidType,
    /// Allocation for a payload failed.
    OutOfMemory,
    /// Length field out of range.
    Length,
    /// External signer could not extend a signature.
    SigExtend,
    /// Record count differs from the block-signature record.
    InvalidRecordCount,
    /// Magic header missing or wrong.
    InvalidHeader,
    /// Ordinary end of file at a record boundary.
    Eof,
    /// Block announces record hashes but one is missing.
    MissingRecordHash,
    /// Block announces tree hashes but one is missing.
    MissingTreeHash,
    /// Recomputed record hash differs from the stored one.
    RecordHashMismatch,
    /// Recomputed tree hash differs from the stored one.
    TreeHashMismatch,
    /// Stored record hash uses another algorithm.
    RecordHashIdMismatch,
    /// Stored tree hash uses another algorithm.
    TreeHashIdMismatch,
    /// Block-signature record not found.
    MissingBlockSig,
    /// Signature does not verify against the recomputed root.
    InvalidSignature,
    /// Timestamp request hash could not be created.
    TsCreateHash,
    /// Timestamp could not be DER-encoded.
    DerEncode,
    /// Hash primitive failed.
    HashCreate,
    /// Signature file ends before the log does, or mid-record.
    EndOfSig,
    /// Log ends before the signature file does.
    EndOfLog,
}

impl ErrorKind {
    /// Every kind, in code order.
    pub const ALL: [ErrorKind; 22] = [
        ErrorKind::Io,
        ErrorKind::Format,
        ErrorKind::InvalidType,
        ErrorKind::OutOfMemory,
        ErrorKind::Length,
        ErrorKind::SigExtend,
        ErrorKind::InvalidRecordCount,
        ErrorKind::InvalidHeader,
        ErrorKind::Eof,
        ErrorKind::MissingRecordHash,
        ErrorKind::MissingTreeHash,
        ErrorKind::RecordHashMismatch,
        ErrorKind::TreeHashMismatch,
        ErrorKind::RecordHashIdMismatch,
        ErrorKind::TreeHashIdMismatch,
        ErrorKind::MissingBlockSig,
        ErrorKind::InvalidSignature,
        ErrorKind::TsCreateHash,
        ErrorKind::DerEncode,
        ErrorKind::HashCreate,
        ErrorKind::EndOfSig,
        ErrorKind::EndOfLog,
    ];

    /// Stable numeric code.
    pub fn code(self) -> u8 {
        match self {
            ErrorKind::Io => 1,
            ErrorKind::Format => 2,
            ErrorKind::InvalidType => 3,
            ErrorKind::OutOfMemory => 4,
            ErrorKind::Length => 5,
            ErrorKind::SigExtend => 6,
            ErrorKind::InvalidRecordCount => 7,
            ErrorKind::InvalidHeader => 8,
            ErrorKind::Eof => 9,
            ErrorKind::MissingRecordHash => 10,
            ErrorKind::MissingTreeHash => 11,
            ErrorKind::RecordHashMismatch => 12,
            ErrorKind::TreeHashMismatch => 13,
            ErrorKind::RecordHashIdMismatch => 14,
            ErrorKind::TreeHashIdMismatch => 15,
            ErrorKind::MissingBlockSig => 16,
            ErrorKind::InvalidSignature => 17,
            ErrorKind::TsCreateHash => 18,
            ErrorKind::DerEncode => 19,
            ErrorKind::HashCreate => 20,
            ErrorKind::EndOfSig => 21,
            ErrorKind::EndOfLog => 22,
        }
    }

    /// Look a kind up by code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.code() == code)
    }

    /// Fixed human-readable message.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Io => "i/o error",
            ErrorKind::Format => "data format error",
            ErrorKind::InvalidType => "invalid/unexpected tlv record type",
            ErrorKind::OutOfMemory => "out of memory",
            ErrorKind::Length => "length record problem",
            ErrorKind::SigExtend => "error extending signature",
            ErrorKind::InvalidRecordCount => {
                "mismatch between actual record count and number in block signature record"
            }
            ErrorKind::InvalidHeader => "invalid file header",
            ErrorKind::Eof => "EOF",
            ErrorKind::MissingRecordHash => "record hash missing",
            ErrorKind::MissingTreeHash => "tree hash missing",
            ErrorKind::RecordHashMismatch => "record hash mismatch",
            ErrorKind::TreeHashMismatch => "tree hash mismatch",
            ErrorKind::RecordHashIdMismatch => "invalid record hash ID",
            ErrorKind::TreeHashIdMismatch => "invalid tree hash ID",
            ErrorKind::MissingBlockSig => "missing block signature record",
            ErrorKind::InvalidSignature => "Signature invalid",
            ErrorKind::TsCreateHash => "error creating HASH",
            ErrorKind::DerEncode => "error DER-encoding RFC3161 timestamp",
            ErrorKind::HashCreate => "error creating hash",
            ErrorKind::EndOfSig => "unexpected end of signature",
            ErrorKind::EndOfLog => "unexpected end of log",
        }
    }

    /// Whether this kind is a verification mismatch rather than a structural failure.
    pub fn is_mismatch(self) -> bool {
        matches!(
            self,
            ErrorKind::RecordHashMismatch
                | ErrorKind::TreeHashMismatch
                | ErrorKind::RecordHashIdMismatch
                | ErrorKind::TreeHashIdMismatch
                | ErrorKind::InvalidSignature
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn render(kind: &ErrorKind, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("{}: {}", kind.as_str(), detail),
        None => kind.as_str().to_string(),
    }
}

/// Engine error: a kind plus optional detail and I/O cause.
#[derive(Debug, Error)]
#[error("{}", render(.kind, .detail))]
pub struct SigError {
    kind: ErrorKind,
    detail: Option<String>,
    #[source]
    source: Option<io::Error>,
}

impl SigError {
    /// Bare error of the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            detail: None,
            source: None,
        }
    }

    /// Error with a free-form detail appended to the fixed message.
    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
            source: None,
        }
    }

    /// I/O failure with context.
    pub fn io(source: io::Error, detail: impl Into<String>) -> Self {
        let kind = if source.kind() == io::ErrorKind::UnexpectedEof {
            ErrorKind::EndOfSig
        } else {
            ErrorKind::Io
        };
        Self {
            kind,
            detail: Some(detail.into()),
            source: Some(source),
        }
    }

    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Free-form detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl From<ErrorKind> for SigError {
    fn from(kind: ErrorKind) -> Self {
        SigError::new(kind)
    }
}

impl From<io::Error> for SigError {
    fn from(source: io::Error) -> Self {
        let kind = if source.kind() == io::ErrorKind::UnexpectedEof {
            ErrorKind::EndOfSig
        } else {
            ErrorKind::Io
        };
        Self {
            kind,
            detail: None,
            source: Some(source),
        }
    }
}

impl From<CryptoError> for SigError {
    fn from(err: CryptoError) -> Self {
        let kind = match err {
            CryptoError::SignatureVerificationFailed
            | CryptoError::InvalidSignatureFormat { .. }
            | CryptoError::InvalidPublicKey => ErrorKind::InvalidSignature,
            CryptoError::UnknownAlgorithmId(_)
            | CryptoError::UnknownAlgorithmName(_)
            | CryptoError::UnsupportedAlgorithm(_) => ErrorKind::HashCreate,
        };
        SigError::with_detail(kind, err.to_string())
    }
}
