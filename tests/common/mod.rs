//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write as IoWrite};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
pub use jubakit::{
    services, EngineVersion, FileFormat, Header, JsonOptions, LoadOptions, Model, ModelError,
    SystemContainer, UserContainer, Value, HEADER_SIZE,
};
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

/// User section of a perceptron classifier saved by a real server with an
/// empty training set: `[1, [classifier_model, weight_manager_model]]`.
pub const CLASSIFIER_USER_RAW: &str = "kgGSkpKAk4CAAJOAgJEAk5EAlQCRgJGAkYCAlQCRgJGAkYCA";

/// Decoded `CLASSIFIER_USER_RAW`.
pub fn classifier_user_raw() -> Vec<u8> {
    BASE64.decode(CLASSIFIER_USER_RAW).expect("fixture is valid base64")
}

/// Weight manager part of `CLASSIFIER_USER_RAW`.
pub fn classifier_weight_manager() -> Vec<u8> {
    classifier_user_raw()[15..].to_vec()
}

/// A fixed header with the given engine version.
pub fn header(major: u32, minor: u32, maint: u32) -> Header {
    Header {
        engine_version_major: major,
        engine_version_minor: minor,
        engine_version_maint: maint,
        ..Header::default()
    }
}

/// System container for `service` with `config`.
pub fn system(service: &str, config: &serde_json::Value) -> SystemContainer {
    SystemContainer {
        version: 1,
        timestamp: 1_500_000_000,
        service_type: service.as_bytes().to_vec(),
        id: b"test_model".to_vec(),
        config: config.to_string().into_bytes(),
    }
}

/// Build a model with a fixed header.
pub fn build_model(service: &str, config: &serde_json::Value, user_raw: Vec<u8>) -> Model {
    let mut m = Model::from_parts(header(1, 0, 4), system(service, config), user_raw)
        .expect("fixture user section decodes");
    m.fix_header().expect("fix_header");
    m
}

/// The perceptron classifier fixture.
pub fn perceptron_classifier() -> Model {
    build_model(
        services::CLASSIFIER,
        &json!({"method": "perceptron", "parameter": {"regularization_weight": 1.0}, "converter": {}}),
        classifier_user_raw(),
    )
}

/// A classifier trained with a nearest-neighbor method. `nn` and `labels`
/// are arbitrary encoded values standing in for the engine-private parts.
pub fn nn_classifier(nn: &[u8], labels: &[u8]) -> Model {
    let mut algorithm = vec![0x92];
    algorithm.extend_from_slice(nn);
    algorithm.extend_from_slice(labels);
    let user_raw = Model::encode_user_parts(1, &[&algorithm, &classifier_weight_manager()])
        .expect("encode user section");
    build_model(
        services::CLASSIFIER,
        &json!({
            "method": "NN",
            "parameter": {
                "method": "euclid_lsh",
                "parameter": {"hash_num": 64},
                "nearest_neighbor_num": 128,
            },
            "converter": {"num_rules": [{"key": "*", "type": "num"}]},
        }),
        user_raw,
    )
}

// ============================================================================
// Files
// ============================================================================

/// Encode a model as a binary model file.
pub fn to_binary(model: &Model) -> Vec<u8> {
    let mut buf = Vec::new();
    model.dump_binary(&mut buf).expect("dump_binary");
    buf
}

/// Encode a model as a JSON model file.
pub fn to_json(model: &Model) -> Vec<u8> {
    let mut buf = Vec::new();
    model
        .dump_json(&mut buf, JsonOptions::default())
        .expect("dump_json");
    buf
}

/// Load a binary model from bytes.
pub fn from_binary(bytes: &[u8], options: LoadOptions) -> Result<Model, ModelError> {
    Model::load_binary(&mut &bytes[..], options)
}

/// Write a model file into `dir`.
pub fn write_model(dir: &Path, name: &str, model: &Model) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, to_binary(model)).expect("write model file");
    path
}

/// Overwrite `bytes` at `offset` in the file at `path`.
pub fn corrupt_file_at_offset(path: &Path, offset: u64, bytes: &[u8]) {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .expect("Failed to open file for corruption");
    file.seek(SeekFrom::Start(offset))
        .expect("Failed to seek in file");
    file.write_all(bytes)
        .expect("Failed to write corruption bytes");
}

/// Truncate a file to a specific size.
pub fn truncate_file(path: &Path, new_size: u64) {
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .expect("Failed to open file for truncation");
    file.set_len(new_size).expect("Failed to truncate file");
}

/// Get file size (0 if not found).
pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Temporary directory for a test.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}
