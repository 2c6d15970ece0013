//! memvis: an empirical memory-visibility demonstration harness.
//!
//! Races a fixed number of worker threads on shared state under several
//! memory-access disciplines (plain relaxed read-modify-write, a
//! release/acquire publication flag, an atomic fetch-and-add counter, a
//! mutex-guarded counter) and checks which disciplines uphold their
//! invariants.

pub mod config;
pub mod errors;
pub mod harness;
pub mod options;
pub mod report;
pub mod trial;
