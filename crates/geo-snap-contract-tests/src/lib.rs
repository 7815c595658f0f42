#![warn(missing_docs)]
//! # geo-snap-contract-tests
//!
//! Test-only crate; the frozen gallery snapshot contract checks live under
//! `tests/`.
