//! # Ports Layer
//!
//! - `inbound` - API the host pipeline drives
//! - `outbound` - Signer, IV source and error sink the host provides

pub mod inbound;
pub mod outbound;
