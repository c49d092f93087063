//! Format Tests
//!
//! Binary, JSON and text renderings of the same model, through files on disk.

use crate::common::*;

#[test]
fn binary_file_roundtrip() {
    let dir = temp_dir();
    let model = perceptron_classifier();
    let path = write_model(dir.path(), "model.jubatus", &model);

    let loaded = Model::load_binary_file(&path, LoadOptions::default()).unwrap();
    assert_eq!(loaded, model);
    assert_eq!(loaded.user_raw(), Some(classifier_user_raw().as_slice()));
    assert_eq!(
        file_size(&path),
        HEADER_SIZE as u64 + loaded.header.system_data_size + loaded.header.user_data_size
    );
}

#[test]
fn binary_bytes_are_stable() {
    let model = perceptron_classifier();
    let bytes = to_binary(&model);
    let reloaded = from_binary(&bytes, LoadOptions::default()).unwrap();
    assert_eq!(to_binary(&reloaded), bytes);
    assert_eq!(&bytes[..8], b"jubatus\0");
}

#[test]
fn json_roundtrip_then_binary() {
    let model = perceptron_classifier();

    let json = to_json(&model);
    let from_json = Model::load_json(&mut json.as_slice()).unwrap();
    assert_eq!(from_json.header, model.header);
    assert_eq!(from_json.system, model.system);
    assert_eq!(from_json.user, model.user);

    let bytes = to_binary(&from_json);
    let from_bin = from_binary(&bytes, LoadOptions::default()).unwrap();
    assert_eq!(from_bin, model);
}

#[test]
fn json_document_shape() {
    let doc: serde_json::Value = serde_json::from_slice(&to_json(&perceptron_classifier())).unwrap();
    assert_eq!(doc["header"]["format_version"], 1);
    assert_eq!(doc["header"]["jubatus_version_maint"], 4);
    assert_eq!(doc["system"]["type"], "classifier");
    assert_eq!(doc["system"]["id"], "test_model");
    assert_eq!(doc["user"]["version"], 1);
    assert_eq!(doc["user_raw"], CLASSIFIER_USER_RAW);
}

#[test]
fn json_without_raw_reencodes_user() {
    let model = perceptron_classifier();
    let mut buf = Vec::new();
    model
        .dump_json(&mut buf, JsonOptions { include_raw: false })
        .unwrap();

    let mut loaded = Model::load_json(&mut buf.as_slice()).unwrap();
    assert!(loaded.user_raw().is_none());
    loaded.fix_header().unwrap();
    // no byte strings in this payload, so the re-encoding is exact
    assert_eq!(loaded, model);
}

#[test]
fn json_file_is_predicted() {
    let dir = temp_dir();
    let model = perceptron_classifier();

    let json_path = dir.path().join("model.json");
    std::fs::write(&json_path, to_json(&model)).unwrap();
    assert_eq!(Model::predict_format(&json_path).unwrap(), FileFormat::Json);

    let bin_path = write_model(dir.path(), "model.jubatus", &model);
    assert_eq!(Model::predict_format(&bin_path).unwrap(), FileFormat::Binary);

    let missing = dir.path().join("missing");
    assert!(matches!(
        Model::predict_format(&missing).unwrap_err(),
        ModelError::Io(_)
    ));
}

#[test]
fn text_dump_sections() {
    let mut buf = Vec::new();
    perceptron_classifier().dump_text(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let meta = text.find("Meta Data").unwrap();
    let system = text.find("System Data").unwrap();
    let user = text.find("User Data").unwrap();
    assert!(meta < system && system < user);
    assert!(text.contains("type:                   classifier\n"));
    assert!(text.contains("jubatus_version_maint:  4\n"));
}

#[test]
fn engine_version_alias_in_json() {
    let model = perceptron_classifier();
    let mut doc: serde_json::Value = serde_json::from_slice(&to_json(&model)).unwrap();
    let header = doc["header"].as_object_mut().unwrap();
    let major = header.remove("jubatus_version_major").unwrap();
    header.insert("engine_version_major".to_string(), major);

    let text = serde_json::to_vec(&doc).unwrap();
    let loaded = Model::load_json(&mut text.as_slice()).unwrap();
    assert_eq!(loaded.header, model.header);
}
