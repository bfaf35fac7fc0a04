//! # Inbound Ports (Driving Ports)
//!
//! The log-pipeline boundary: called once per record and once per block.

use crate::domain::block_sig::BlockSignature;
use crate::domain::errors::Result;

/// Per-file signing API consumed by the host pipeline.
pub trait BlockSigningApi {
    /// Open a block explicitly.
    ///
    /// `add_record` opens one on demand, so calling this is optional.
    fn init_block(&mut self) -> Result<()>;

    /// Hash one record into the open block, in receipt order.
    fn add_record(&mut self, record: &[u8]) -> Result<()>;

    /// Fold, sign and persist the open block.
    fn finish_block(&mut self) -> Result<BlockSignature>;

    /// Abandon the open block; nothing is signed for it.
    fn discard_block(&mut self) -> Result<()>;
}
