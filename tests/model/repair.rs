//! Repair Tests
//!
//! Editing a model leaves its header stale; `fix_header` makes it valid again.

use crate::common::*;

#[test]
fn replaced_config_is_rejected_until_fixed() {
    let mut model = perceptron_classifier();
    model.replace_config(r#"{"method": "AROW", "parameter": {"regularization_weight": 0.5}, "converter": {}}"#);

    let stale = to_binary(&model);
    assert!(from_binary(&stale, LoadOptions::default()).is_err());

    model.fix_header().unwrap();
    let fixed = from_binary(&to_binary(&model), LoadOptions::default()).unwrap();
    assert_eq!(fixed.config().unwrap()["method"], "AROW");
}

#[test]
fn replaced_version_survives_reload() {
    let mut model = perceptron_classifier();
    model.replace_version("1.1.0".parse::<EngineVersion>().unwrap());
    model.fix_header().unwrap();

    let reloaded = from_binary(&to_binary(&model), LoadOptions::default()).unwrap();
    assert_eq!(reloaded.header.engine_version(), (1, 1, 0));
}

#[test]
fn fix_header_is_idempotent() {
    let mut model = perceptron_classifier();
    model.replace_config("{}");
    model.fix_header().unwrap();
    let once = model.header;
    model.fix_header().unwrap();
    assert_eq!(model.header, once);
}

#[test]
fn wrong_sizes_are_repaired() {
    let dir = temp_dir();
    let model = perceptron_classifier();
    let path = write_model(dir.path(), "model.jubatus", &model);

    // claim one more user byte than the file holds
    let declared = model.header.user_data_size + 1;
    corrupt_file_at_offset(&path, 40, &declared.to_be_bytes());
    assert!(Model::load_binary_file(&path, LoadOptions::default()).is_err());

    let mut loaded = Model::load_binary_file(&path, LoadOptions::no_validate()).unwrap();
    assert_eq!(loaded.header.user_data_size, declared);
    loaded.fix_header().unwrap();
    loaded.validate().unwrap();
    assert_eq!(loaded, model);
}

#[test]
fn user_raw_replacement_needs_fix() {
    let mut model = perceptron_classifier();
    let raw = Model::encode_user_parts(1, &[&[0x80][..], &[0x90][..]]).unwrap();
    model.set_user_raw(raw.clone()).unwrap();
    assert!(model.validate().is_err());

    model.fix_header().unwrap();
    model.validate().unwrap();
    assert_eq!(model.header.user_data_size, raw.len() as u64);
    assert_eq!(model.data(), &Value::Array(vec![Value::Map(vec![]), Value::Array(vec![])]));
}
