//! # Signature File Dump
//!
//! Human-readable rendering of signature-file records.

use std::io::{Read, Write};

use crate::codec::tlv::{self, TlvRecord};
use crate::codec::{block_sig, types};
use crate::domain::block_sig::BlockSignature;
use crate::domain::errors::{ErrorKind, Result};
use crate::domain::imprint::Imprint;

const SHORT_HEX: usize = 8;

fn short_hex(bytes: &[u8], verbose: bool) -> String {
    let full = hex::encode(bytes);
    if verbose || full.len() <= SHORT_HEX * 2 {
        full
    } else {
        format!("{}...", &full[..SHORT_HEX * 2])
    }
}

/// `id.hex` form of an imprint; abbreviated unless verbose.
pub fn render_imprint(imprint: &Imprint, verbose: bool) -> String {
    format!("{:02x}.{}", imprint.hash_id(), short_hex(imprint.digest(), verbose))
}

/// Parameters of a block signature, one per line.
pub fn render_block_sig(bs: &BlockSignature, verbose: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("\tHash Algorithm: {}\n", bs.hash_algorithm.name()));
    out.push_str(&format!("\tIV: {}\n", short_hex(&bs.iv, verbose)));
    out.push_str(&format!("\tLast Hash: {}\n", render_imprint(&bs.last_hash, verbose)));
    out.push_str(&format!("\tRecord Count: {}\n", bs.record_count));
    out.push_str(&format!("\tSignature Type: {}\n", bs.scheme));
    out.push_str(&format!("\tSignature Length: {}\n", bs.signature.len()));
    if verbose {
        out.push_str(&format!("\tSignature: {}\n", hex::encode(&bs.signature)));
    }
    out
}

/// One record, with its type and a decoded body where the type is known.
pub fn render_tlv(rec: &TlvRecord, verbose: bool) -> Result<String> {
    let head = format!(
        "[0x{:04x}]{}{}, length {}",
        rec.tlv_type(),
        types::name(rec.tlv_type()),
        if rec.is_critical() { "" } else { " (non-critical)" },
        rec.len()
    );
    let body = match rec.tlv_type() {
        types::RECORD_HASH | types::TREE_HASH => {
            format!("\t{}\n", render_imprint(&Imprint::from_bytes(rec.payload())?, verbose))
        }
        types::BLOCK_SIG => render_block_sig(&block_sig::decode(rec)?, verbose),
        _ if verbose => format!("\t{}\n", hex::encode(rec.payload())),
        _ => String::new(),
    };
    Ok(format!("{}\n{}", head, body))
}

/// Write every record of a signature file to `out`; returns the record count.
pub fn dump_sig_file<R: Read, W: Write>(sig: &mut R, out: &mut W, verbose: bool) -> Result<u64> {
    tlv::check_file_header(sig)?;
    writeln!(out, "File Header: {}", String::from_utf8_lossy(tlv::SIG_FILE_MAGIC))?;

    let mut count = 0u64;
    loop {
        let rec = match tlv::read_record(sig) {
            Ok(rec) => rec,
            Err(e) if e.kind() == ErrorKind::Eof => break,
            Err(e) => return Err(e),
        };
        count += 1;
        out.write_all(render_tlv(&rec, verbose)?.as_bytes())?;
    }
    Ok(count)
}
