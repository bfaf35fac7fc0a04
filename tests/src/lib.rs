//! # Logsig Test Suite
//!
//! Unified test crate driving `logsig-engine` through real files.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Fixtures: signed logs, independent root recomputation
//! └── integration/
//!     ├── flows.rs      # Sign → verify round trips, block splitting, extension
//!     ├── tamper.rs     # Modified, missing and extra data
//!     └── recovery.rs   # Restart, torn writes, state-file drift
//!
//! tests/benches/
//! └── signing_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p logsig-tests
//!
//! # By category
//! cargo test -p logsig-tests integration::tamper::
//!
//! # With engine logs
//! RUST_LOG=logsig_engine=debug cargo test -p logsig-tests -- --nocapture
//!
//! # Benchmarks
//! cargo bench -p logsig-tests
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
