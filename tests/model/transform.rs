//! Transformation Tests
//!
//! Transformed models must be valid model files of the target service.

use crate::common::*;
use serde_json::json;

#[test]
fn perceptron_classifier_to_weight() {
    let model = perceptron_classifier();
    let weight = model.transform(services::WEIGHT).unwrap();

    let mut expected = vec![0x92, 0x01, 0x91];
    expected.extend_from_slice(&classifier_weight_manager());
    assert_eq!(weight.user_raw(), Some(expected.as_slice()));
    assert_eq!(weight.header.user_data_size, expected.len() as u64);
    assert_eq!(weight.system.service_type(), "weight");
    assert_eq!(weight.config().unwrap(), json!({"converter": {}}));
    assert_eq!(weight.system.id, model.system.id);
    assert_eq!(weight.system.timestamp, model.system.timestamp);
    assert_eq!(weight.header.engine_version(), model.header.engine_version());

    let reloaded = from_binary(&to_binary(&weight), LoadOptions::default()).unwrap();
    assert_eq!(reloaded, weight);
}

#[test]
fn nn_classifier_to_nearest_neighbor() {
    let nn = [0x92, 0xa3, b'l', b's', b'h', 0x80];
    let labels = [0x81, 0xa1, b'a', 0x01];
    let model = nn_classifier(&nn, &labels);

    let out = model.transform(services::NEAREST_NEIGHBOR).unwrap();
    assert_eq!(out.system.service_type(), "nearest_neighbor");
    assert_eq!(
        out.user_raw().unwrap(),
        Model::encode_user_parts(1, &[&nn, &classifier_weight_manager()])
            .unwrap()
            .as_slice()
    );
    assert_eq!(
        out.config().unwrap(),
        json!({
            "method": "euclid_lsh",
            "parameter": {"hash_num": 64},
            "converter": {"num_rules": [{"key": "*", "type": "num"}]},
        })
    );
    out.validate().unwrap();
}

#[test]
fn nn_classifier_to_recommender_is_unsupported() {
    let model = nn_classifier(&[0xc0], &[0xc0]);
    let err = model.transform(services::RECOMMENDER).unwrap_err();
    match err {
        ModelError::UnsupportedTransformation {
            source_type,
            target,
        } => {
            assert_eq!(source_type, "classifier");
            assert_eq!(target, "recommender");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        model.transform(services::RECOMMENDER).unwrap_err().to_string(),
        "this classifier model cannot be transformed as recommender"
    );
}

#[test]
fn transformed_model_written_to_disk() {
    let dir = temp_dir();
    let model = nn_classifier(&[0x90], &[0x80]);
    let out = model.transform(services::NEAREST_NEIGHBOR).unwrap();
    let path = write_model(dir.path(), "nn.jubatus", &out);

    let loaded = Model::load_binary_file(&path, LoadOptions::default()).unwrap();
    assert_eq!(loaded.system.service_type(), "nearest_neighbor");
    assert_eq!(loaded, out);
}

#[test]
fn transform_from_json_without_raw() {
    let model = perceptron_classifier();
    let mut buf = Vec::new();
    model
        .dump_json(&mut buf, JsonOptions { include_raw: false })
        .unwrap();
    let loaded = Model::load_json(&mut buf.as_slice()).unwrap();

    let weight = loaded.transform(services::WEIGHT).unwrap();
    assert_eq!(weight, model.transform(services::WEIGHT).unwrap());
}
