//! Test helpers for epinet.
//!
//! Small network fixtures and goodness-of-fit checks shared by the unit
//! and integration tests of the other crates.

pub mod networks;
pub mod stats;
