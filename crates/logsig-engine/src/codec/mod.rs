//! # Codec Layer
//!
//! Byte-level formats of the signature file and the state file.
//!
//! ## Modules
//!
//! - `tlv` - Type-length-value framing and the signature-file magic
//! - `types` - TLV type registry
//! - `block_sig` - Block-signature record encoding
//! - `state_file` - Resumable chain state

pub mod block_sig;
pub mod state_file;
pub mod tlv;
pub mod types;

pub use tlv::{read_record, write_record, TlvRecord};
