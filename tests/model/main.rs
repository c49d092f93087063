//! Integration tests for model files.
//!
//! Unit tests in crates/model/src/ cover each codec in isolation. These
//! tests go through files on disk and across formats, and check the
//! corruption and transformation guarantees end to end.

#[path = "../common/mod.rs"]
mod common;

mod corruption;
mod formats;
mod repair;
mod transform;
