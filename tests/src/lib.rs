//! # SDT Router Test Suite
//!
//! Unified test crate for behavior that spans several router components.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs      # Full operation lifecycle, fail-open vs abort
//!     └── isolation.rs  # Concurrent operations, cancellation, ring stability
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sdt-tests
//!
//! # By category
//! cargo test -p sdt-tests integration::flows
//! cargo test -p sdt-tests integration::isolation
//!
//! # Benchmarks
//! cargo bench -p sdt-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
