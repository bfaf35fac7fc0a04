//! # TLV Framing
//!
//! Type-length-value envelope shared by every persisted record.
//!
//! ## Header Layout
//!
//! ```text
//! TLV8  (2 bytes): [N F 0 t4..t0] [len]
//! TLV16 (4 bytes): [N F 1 t12..t8] [t7..t0] [len_hi] [len_lo]
//!
//! N = non-critical, F = forward, bit 5 selects the 16-bit form
//! ```
//!
//! The framer knows nothing about payload meaning; consumers decide what to
//! do with types they do not recognise (see [`TlvRecord::is_critical`]).

use std::io::{self, Read, Write};

use crate::domain::errors::{ErrorKind, Result, SigError};

/// Non-critical flag: unknown records of this type may be skipped.
pub const FLAG_NONCRIT: u8 = 0x80;
/// Forward flag: unknown records should be copied through unchanged.
pub const FLAG_FORWARD: u8 = 0x40;
/// Extended (16-bit) type and length.
pub const FLAG_TLV16: u8 = 0x20;
/// Type bits of the first header byte.
pub const TYPE_MASK: u8 = 0x1f;

/// Largest payload a record can carry.
pub const MAX_PAYLOAD: usize = 0xffff;
/// Largest type a TLV16 header can carry.
pub const MAX_TLV_TYPE: u16 = 0x1fff;

/// Magic literal opening every signature file.
pub const SIG_FILE_MAGIC: &[u8; 8] = b"LOGSIG10";

// =============================================================================
// RECORD
// =============================================================================

/// One framed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvRecord {
    tlv_type: u16,
    flags: u8,
    header: Vec<u8>,
    payload: Vec<u8>,
}

impl TlvRecord {
    /// Frame a payload, choosing the shortest header that fits.
    pub fn new(tlv_type: u16, payload: Vec<u8>) -> Result<Self> {
        Self::with_flags(tlv_type, 0, payload)
    }

    /// Frame a payload with explicit `FLAG_NONCRIT`/`FLAG_FORWARD` bits.
    ///
    /// # Errors
    ///
    /// `Length` when the payload exceeds [`MAX_PAYLOAD`] or the type exceeds
    /// [`MAX_TLV_TYPE`]. Nothing is written in that case.
    pub fn with_flags(tlv_type: u16, flags: u8, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD {
            return Err(SigError::with_detail(
                ErrorKind::Length,
                format!("payload of {} bytes exceeds {}", payload.len(), MAX_PAYLOAD),
            ));
        }
        if tlv_type > MAX_TLV_TYPE {
            return Err(SigError::with_detail(
                ErrorKind::Length,
                format!("tlv type 0x{:x} does not fit in 13 bits", tlv_type),
            ));
        }
        let flags = flags & (FLAG_NONCRIT | FLAG_FORWARD);
        let len = payload.len();
        let header = if tlv_type <= TYPE_MASK as u16 && len <= 0xff {
            vec![flags | tlv_type as u8, len as u8]
        } else {
            vec![
                flags | FLAG_TLV16 | (tlv_type >> 8) as u8,
                (tlv_type & 0xff) as u8,
                (len >> 8) as u8,
                (len & 0xff) as u8,
            ]
        };
        Ok(Self {
            tlv_type,
            flags,
            header,
            payload,
        })
    }

    /// Record type.
    pub fn tlv_type(&self) -> u16 {
        self.tlv_type
    }

    /// Payload length.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True for a zero-length payload.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the record, keeping the payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Header bytes exactly as read or written (2 or 4 bytes).
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Whether the 4-byte header form is used.
    pub fn is_tlv16(&self) -> bool {
        self.header.len() == 4
    }

    /// Unknown critical records must fail the reader.
    pub fn is_critical(&self) -> bool {
        self.flags & FLAG_NONCRIT == 0
    }

    /// Forward flag.
    pub fn is_forward(&self) -> bool {
        self.flags & FLAG_FORWARD != 0
    }

    /// Bytes on the wire: header then payload.
    pub fn encoded_len(&self) -> usize {
        self.header.len() + self.payload.len()
    }

    /// Header and payload in one buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Reject a record whose type the caller does not know, unless non-critical.
    ///
    /// Returns `Ok(true)` when the record should be skipped.
    pub fn skip_unknown(&self) -> Result<bool> {
        if self.is_critical() {
            Err(SigError::with_detail(
                ErrorKind::InvalidType,
                format!("unknown critical tlv 0x{:04x}", self.tlv_type),
            ))
        } else {
            Ok(true)
        }
    }
}

// =============================================================================
// READING
// =============================================================================

/// Read until `buf` is full or the stream ends; returns the bytes read.
fn read_up_to<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(SigError::io(e, "reading tlv")),
        }
    }
    Ok(filled)
}

fn read_exact_or_eos<R: Read + ?Sized>(r: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    let got = read_up_to(r, buf)?;
    if got < buf.len() {
        return Err(SigError::with_detail(
            ErrorKind::EndOfSig,
            format!("{}: wanted {} bytes, got {}", what, buf.len(), got),
        ));
    }
    Ok(())
}

/// Read the record header only.
///
/// Returns `(type, flags, header bytes, payload length)`.
///
/// # Errors
///
/// - `Eof` when the stream ends exactly at a record boundary
/// - `EndOfSig` when it ends inside the header
pub fn read_header<R: Read + ?Sized>(r: &mut R) -> Result<(u16, u8, Vec<u8>, usize)> {
    let mut first = [0u8; 1];
    if read_up_to(r, &mut first)? == 0 {
        return Err(SigError::new(ErrorKind::Eof));
    }
    let b0 = first[0];
    let flags = b0 & (FLAG_NONCRIT | FLAG_FORWARD);

    if b0 & FLAG_TLV16 != 0 {
        let mut rest = [0u8; 3];
        read_exact_or_eos(r, &mut rest, "tlv16 header")?;
        let tlv_type = (((b0 & TYPE_MASK) as u16) << 8) | rest[0] as u16;
        let len = ((rest[1] as usize) << 8) | rest[2] as usize;
        Ok((tlv_type, flags, vec![b0, rest[0], rest[1], rest[2]], len))
    } else {
        let mut rest = [0u8; 1];
        read_exact_or_eos(r, &mut rest, "tlv8 header")?;
        Ok(((b0 & TYPE_MASK) as u16, flags, vec![b0, rest[0]], rest[0] as usize))
    }
}

/// Read one complete record.
///
/// # Errors
///
/// - `Eof` at a clean record boundary
/// - `EndOfSig` if the stream ends mid-header or mid-payload
/// - `OutOfMemory` if the payload buffer cannot be allocated
pub fn read_record<R: Read + ?Sized>(r: &mut R) -> Result<TlvRecord> {
    let (tlv_type, flags, header, len) = read_header(r)?;

    let mut payload = Vec::new();
    payload
        .try_reserve_exact(len)
        .map_err(|_| SigError::with_detail(ErrorKind::OutOfMemory, format!("{} byte payload", len)))?;
    payload.resize(len, 0);
    read_exact_or_eos(r, &mut payload, "tlv payload")?;

    Ok(TlvRecord {
        tlv_type,
        flags,
        header,
        payload,
    })
}

/// Read every record from a byte slice, e.g. the children of a composite record.
pub fn read_all(mut bytes: &[u8]) -> Result<Vec<TlvRecord>> {
    let mut out = Vec::new();
    loop {
        match read_record(&mut bytes) {
            Ok(rec) => out.push(rec),
            Err(e) if e.kind() == ErrorKind::Eof => return Ok(out),
            Err(e) => return Err(e),
        }
    }
}

// =============================================================================
// WRITING
// =============================================================================

/// Write one record with a single `write_all`.
pub fn write_record<W: Write + ?Sized>(w: &mut W, rec: &TlvRecord) -> Result<()> {
    w.write_all(&rec.to_bytes())
        .map_err(|e| SigError::io(e, format!("writing tlv 0x{:04x}", rec.tlv_type)))
}

/// Check the 8-byte magic at the start of a signature file.
pub fn check_file_header<R: Read + ?Sized>(r: &mut R) -> Result<()> {
    let mut magic = [0u8; 8];
    let got = read_up_to(r, &mut magic)?;
    if got != magic.len() || &magic != SIG_FILE_MAGIC {
        return Err(SigError::with_detail(
            ErrorKind::InvalidHeader,
            format!("expected {:?}", String::from_utf8_lossy(SIG_FILE_MAGIC)),
        ));
    }
    Ok(())
}

/// Write the 8-byte magic.
pub fn write_file_header<W: Write + ?Sized>(w: &mut W) -> Result<()> {
    w.write_all(SIG_FILE_MAGIC)
        .map_err(|e| SigError::io(e, "writing signature file header"))
}
