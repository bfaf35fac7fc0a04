//! # Integration Tests
//!
//! End-to-end scenarios over real log and signature files.

pub mod flows;
pub mod recovery;
pub mod tamper;
